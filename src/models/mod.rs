pub mod checkout;
pub mod payment;
pub mod plan;
