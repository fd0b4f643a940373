use crate::models::payment::PixIntent;
use crate::models::plan::{PlanId, Region};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Pix,
    Card,
}

impl PaymentMethod {
    /// Whether the method needs an intent from the external provider.
    pub fn requires_intent(&self) -> bool {
        matches!(self, PaymentMethod::Pix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
}

impl Locale {
    /// Keeps only the primary language subtag: `en_US.UTF-8`, `en-GB` and
    /// `en_US:en` all become `en`.
    pub fn new(language: impl Into<String>) -> Self {
        let raw = language.into();
        let primary = raw
            .split(|c| matches!(c, '_' | '-' | '.' | ':' | '@'))
            .next()
            .unwrap_or_default()
            .trim();
        Self {
            language: primary.to_ascii_lowercase(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardField {
    Number,
    HolderName,
    Expiry,
    Cvv,
}

impl CardField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardField::Number => "number",
            CardField::HolderName => "holder_name",
            CardField::Expiry => "expiry",
            CardField::Cvv => "cvv",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub holder_name: String,
    pub expiry: String,
    pub cvv: String,
}

impl CardDetails {
    /// First empty field, if any. Only presence is checked.
    pub fn missing_field(&self) -> Option<CardField> {
        [
            (CardField::Number, &self.number),
            (CardField::HolderName, &self.holder_name),
            (CardField::Expiry, &self.expiry),
            (CardField::Cvv, &self.cvv),
        ]
        .into_iter()
        .find(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coupon {
    pub input: String,
    pub applied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Success,
    Abandoned,
}

/// The single screen a checkout is showing.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Offer,
    ConfirmingCountdown { remaining: u32 },
    /// Countdown finished but the intent request has not resolved yet.
    AwaitingIntent,
    QrDisplayed {
        intent: PixIntent,
        time_left: u32,
        copied: bool,
    },
    ExpiredDisplayed,
    ErrorDisplayed { message: String },
    CreditCardForm,
    Validating { remaining: u32 },
    Result(CheckoutOutcome),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Offer => "offer",
            Screen::ConfirmingCountdown { .. } => "confirming_countdown",
            Screen::AwaitingIntent => "awaiting_intent",
            Screen::QrDisplayed { .. } => "qr_displayed",
            Screen::ExpiredDisplayed => "expired_displayed",
            Screen::ErrorDisplayed { .. } => "error_displayed",
            Screen::CreditCardForm => "credit_card_form",
            Screen::Validating { .. } => "validating",
            Screen::Result(_) => "result",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Screen::Result(_))
    }
}

/// Aggregate root of one checkout attempt. Never persisted.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: Uuid,
    pub plan: PlanId,
    pub region: Region,
    pub method: PaymentMethod,
    pub coupon: Coupon,
    pub pix_intent: Option<PixIntent>,
    pub card_details: Option<CardDetails>,
    pub countdown_value: u32,
    pub expiry_value: u32,
    pub screen: Screen,
    /// Bumped whenever a new intent request is issued or the intent is discarded.
    pub attempt: u64,
}

impl CheckoutSession {
    pub fn new(plan: PlanId, region: Region, method: PaymentMethod, coupon_applied: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan,
            region,
            method,
            coupon: Coupon {
                input: String::new(),
                applied: coupon_applied,
            },
            pix_intent: None,
            card_details: None,
            countdown_value: 0,
            expiry_value: 0,
            screen: Screen::Offer,
            attempt: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_card() -> CardDetails {
        CardDetails {
            number: "4111 1111 1111 1111".to_string(),
            holder_name: "Maria Silva".to_string(),
            expiry: "12/29".to_string(),
            cvv: "123".to_string(),
        }
    }

    #[test]
    fn test_missing_field_detects_each_empty_field() {
        assert_eq!(complete_card().missing_field(), None);

        let mut card = complete_card();
        card.number.clear();
        assert_eq!(card.missing_field(), Some(CardField::Number));

        let mut card = complete_card();
        card.holder_name.clear();
        assert_eq!(card.missing_field(), Some(CardField::HolderName));

        let mut card = complete_card();
        card.expiry.clear();
        assert_eq!(card.missing_field(), Some(CardField::Expiry));

        let mut card = complete_card();
        card.cvv.clear();
        assert_eq!(card.missing_field(), Some(CardField::Cvv));
    }

    #[test]
    fn test_card_format_is_not_validated() {
        let card = CardDetails {
            number: "x".to_string(),
            holder_name: "y".to_string(),
            expiry: "z".to_string(),
            cvv: "w".to_string(),
        };
        assert_eq!(card.missing_field(), None);
    }

    #[test]
    fn test_locale_is_normalized() {
        assert_eq!(Locale::new("EN").language(), "en");
        assert_eq!(Locale::new("en_US:en").language(), "en");
        assert_eq!(Locale::new("pt-BR").language(), "pt");
        assert_eq!(Locale::new("en_GB.UTF-8").language(), "en");
    }
}
