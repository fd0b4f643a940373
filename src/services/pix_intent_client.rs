use crate::app::config::Config;
use crate::models::payment::{IntentRequest, PixIntent, PixResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("amount must be a positive number of minor units")]
    InvalidAmount,
    #[error("intent reference must not be empty")]
    InvalidReference,
    #[error("failed to build HTTP client: {0}")]
    Setup(reqwest::Error),
    #[error("payment provider unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("payment provider returned HTTP {0}")]
    Status(u16),
    #[error("malformed payment provider response: {0}")]
    Malformed(String),
}

/// Creates one payment intent per call. Implementations must not retry.
#[async_trait]
pub trait PaymentIntentClient: Send + Sync {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PixIntent, IntentError>;
}

pub struct HttpPixClient {
    client: Client,
    endpoint: String,
}

impl HttpPixClient {
    pub fn new(config: &Config) -> Result<Self, IntentError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .build()
            .map_err(IntentError::Setup)?;

        Ok(Self {
            client,
            endpoint: config.pix_endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_request(&self, request: &IntentRequest) -> Result<PixIntent, IntentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request.to_payload())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IntentError::Status(status.as_u16()));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| IntentError::Malformed(e.to_string()))?;
        let body: PixResponse = serde_json::from_value(raw.clone())
            .map_err(|e| IntentError::Malformed(e.to_string()))?;

        if body.qrcode.is_empty() {
            return Err(IntentError::Malformed("empty qrcode".to_string()));
        }

        Ok(PixIntent {
            id: body.id,
            qr_payload: body.qrcode,
            display_code: body.qr_code,
            raw_response: raw,
        })
    }
}

#[async_trait]
impl PaymentIntentClient for HttpPixClient {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PixIntent, IntentError> {
        if request.amount_minor == 0 {
            return Err(IntentError::InvalidAmount);
        }
        if request.reference.is_empty() {
            return Err(IntentError::InvalidReference);
        }

        match self.send_request(request).await {
            Ok(intent) => {
                info!("PIX intent {} created for {}", intent.id, request.reference);
                Ok(intent)
            }
            Err(e) => {
                error!("Failed to create PIX intent {}: {}", request.reference, e);
                Err(e)
            }
        }
    }
}
