use serde::{Deserialize, Serialize};

/// Everything the provider needs to create one PIX intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    pub amount_minor: u64,
    pub reference: String,
    pub title: String,
    pub expires_in_days: u32,
}

impl IntentRequest {
    pub fn to_payload(&self) -> PixPayload {
        PixPayload {
            amount: self.amount_minor,
            items: vec![PixItem {
                title: self.title.clone(),
                unit_price: self.amount_minor,
                quantity: 1,
                tangible: false,
                external_ref: self.reference.clone(),
            }],
            pix: PixOptions {
                expires_in_days: self.expires_in_days,
            },
            payment_method: "PIX".to_string(),
        }
    }
}

/// A created payment intent. `qr_payload` is both the QR content and the
/// copy-paste code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixIntent {
    pub id: String,
    pub qr_payload: String,
    pub display_code: String,
    pub raw_response: serde_json::Value,
}

// Payload enviado ao provedor PIX
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixPayload {
    pub amount: u64,
    pub items: Vec<PixItem>,
    pub pix: PixOptions,
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixItem {
    pub title: String,
    #[serde(rename = "unitPrice")]
    pub unit_price: u64,
    pub quantity: u32,
    pub tangible: bool,
    #[serde(rename = "externalRef")]
    pub external_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixOptions {
    #[serde(rename = "expiresInDays")]
    pub expires_in_days: u32,
}

// Resposta mínima exigida do provedor
#[derive(Debug, Clone, Deserialize)]
pub struct PixResponse {
    #[serde(rename = "qrCode")]
    pub qr_code: String,
    pub qrcode: String,
    pub id: String,
}
