#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use pix_checkout::app::config::FlowProfile;
use pix_checkout::models::checkout::{CardDetails, PaymentMethod, Screen};
use pix_checkout::models::payment::{IntentRequest, PixIntent};
use pix_checkout::models::plan::Region;
use pix_checkout::services::clipboard::MemoryClipboard;
use pix_checkout::services::coupon::CanonicalCoupon;
use pix_checkout::services::notifications::{StaticTranslator, ToastQueue};
use pix_checkout::services::{
    CheckoutOptions, CheckoutService, Collaborators, IntentError, PaymentIntentClient,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

pub const QR_PAYLOAD: &str = "000201...discount";

pub fn intent(id: &str) -> PixIntent {
    PixIntent {
        id: id.to_string(),
        qr_payload: QR_PAYLOAD.to_string(),
        display_code: "display".to_string(),
        raw_response: serde_json::json!({ "qrCode": "display", "qrcode": QR_PAYLOAD, "id": id }),
    }
}

/// Scripted provider. Each call pops the next response after `delay`.
pub struct FakeIntentClient {
    responses: Mutex<VecDeque<Result<PixIntent, u16>>>,
    requests: Mutex<Vec<IntentRequest>>,
    delay: Duration,
}

impl FakeIntentClient {
    pub fn new(responses: Vec<Result<PixIntent, u16>>) -> Self {
        Self::with_delay(responses, Duration::ZERO)
    }

    pub fn with_delay(responses: Vec<Result<PixIntent, u16>>, delay: Duration) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            delay,
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<IntentRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl PaymentIntentClient for FakeIntentClient {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PixIntent, IntentError> {
        self.requests.lock().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.responses.lock().pop_front();
        match next {
            Some(Ok(intent)) => Ok(intent),
            Some(Err(status)) => Err(IntentError::Status(status)),
            None => Err(IntentError::Malformed("no scripted response".to_string())),
        }
    }
}

pub struct Harness {
    pub checkout: CheckoutService,
    pub intents: Arc<FakeIntentClient>,
    pub toasts: Arc<ToastQueue>,
    pub clipboard: Arc<MemoryClipboard>,
}

/// Default collaborators around `intents`, Portuguese strings.
pub fn collaborators(intents: Arc<FakeIntentClient>) -> Collaborators {
    Collaborators {
        intents,
        translator: Arc::new(StaticTranslator::new("pt")),
        notifier: Arc::new(ToastQueue::new()),
        clipboard: Arc::new(MemoryClipboard::new()),
        coupons: Arc::new(CanonicalCoupon::new("MIVAI2026")),
    }
}

pub fn harness(
    profile: FlowProfile,
    region: Region,
    method: PaymentMethod,
    intents: FakeIntentClient,
) -> Harness {
    let intents = Arc::new(intents);
    let toasts = Arc::new(ToastQueue::new());
    let clipboard = Arc::new(MemoryClipboard::new());
    let language = match region {
        Region::International => "en",
        Region::Brazil => "pt",
    };

    let deps = Collaborators {
        intents: intents.clone(),
        translator: Arc::new(StaticTranslator::new(language)),
        notifier: toasts.clone(),
        clipboard: clipboard.clone(),
        ..collaborators(intents.clone())
    };
    let checkout = CheckoutService::new(
        Arc::new(profile),
        CheckoutOptions { region, method },
        deps,
        64,
    )
    .expect("profile contains its default plan");

    Harness {
        checkout,
        intents,
        toasts,
        clipboard,
    }
}

pub fn pix_harness(intents: FakeIntentClient) -> Harness {
    harness(FlowProfile::plan_page(), Region::Brazil, PaymentMethod::Pix, intents)
}

pub fn card_harness() -> Harness {
    harness(
        FlowProfile::plan_page(),
        Region::International,
        PaymentMethod::Card,
        FakeIntentClient::new(vec![]),
    )
}

/// Runs the event loop until `done` holds, failing instead of hanging.
pub async fn drive<F>(checkout: &mut CheckoutService, done: F) -> Screen
where
    F: FnMut(&Screen) -> bool,
{
    tokio::time::timeout(Duration::from_secs(3600), checkout.run_until(done))
        .await
        .expect("screen never reached")
        .clone()
}

pub fn complete_card() -> CardDetails {
    CardDetails {
        number: "4111 1111 1111 1111".to_string(),
        holder_name: "Jane Doe".to_string(),
        expiry: "12/29".to_string(),
        cvv: "123".to_string(),
    }
}
