use crate::models::payment::PixIntent;
use crate::services::countdown::TimerHandle;
use tokio::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Confirm,
    QrExpiry,
    CopiedFeedback,
    CardProcessing,
}

/// Every failure of the intent request looks the same to the checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentFailure {
    pub reason: String,
}

/// Asynchronous inputs of the checkout state machine.
#[derive(Debug, Clone)]
pub enum CheckoutEvent {
    Tick {
        timer: TimerKind,
        handle: TimerHandle,
        remaining: u32,
    },
    IntentResolved {
        attempt: u64,
        result: Result<PixIntent, IntentFailure>,
    },
}

pub fn create_queue(buffer: usize) -> (Sender<CheckoutEvent>, Receiver<CheckoutEvent>) {
    mpsc::channel(buffer)
}
