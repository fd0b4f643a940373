pub mod auth_session;
pub mod checkout_service;
pub mod clipboard;
pub mod countdown;
pub mod coupon;
pub mod notifications;
pub mod pix_intent_client;
pub mod policy;

pub use checkout_service::{
    CheckoutError, CheckoutOptions, CheckoutService, Collaborators, OfferView, PlanQuote,
    ValidationError,
};
pub use pix_intent_client::{HttpPixClient, IntentError, PaymentIntentClient};
