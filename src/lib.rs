//! Activation and plan checkout flow: plan catalog, coupon, countdowns,
//! PIX intent creation and the state machine that sequences them.

pub mod app;
pub mod models;
pub mod queue;
pub mod services;
pub mod utils;

pub use app::config::{Config, ConfigError, FlowProfile};
pub use models::checkout::{CardDetails, CheckoutOutcome, Locale, PaymentMethod, Screen};
pub use models::payment::PixIntent;
pub use services::{CheckoutError, CheckoutOptions, CheckoutService, Collaborators};
