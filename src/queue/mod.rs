pub mod checkout_queue;
