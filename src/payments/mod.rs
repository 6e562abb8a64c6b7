//! Platron payment gateway integration
//!
//! Signed outbound requests (init payment, payment systems, status, refund)
//! and verification of the gateway's inbound result callbacks.

pub mod callback;
pub mod codes;
pub mod config;
pub mod handler;
pub mod providers;
pub mod request;
pub mod response;
pub mod signature;
pub mod traits;
pub mod types;
pub mod xml;

pub use callback::CallbackValidator;
pub use config::PlatronConfig;
pub use providers::PlatronClient;
pub use response::GatewayResponse;
pub use signature::SignatureCodec;
pub use types::{CallbackOutcome, CallbackState, InitPaymentRequest, ParameterSet, Script, ScriptName};
