//! Platron merchant integration
//!
//! Builds and signs requests to the Platron payment gateway, parses its XML
//! replies and verifies the result callbacks it posts back to the merchant.
//! The `server` feature adds an axum service hosting the result endpoint.

pub mod error;
pub mod payments;

#[cfg(feature = "server")]
pub mod api;
#[cfg(feature = "server")]
pub mod config;

pub use error::{PlatronError, PlatronResult};
