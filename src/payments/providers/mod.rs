//! Payment gateway implementations
//!
//! Concrete implementations of the PaymentGateway trait.

pub mod platron;

pub use platron::PlatronClient;
