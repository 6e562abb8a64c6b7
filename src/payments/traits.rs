//! Payment gateway trait definitions
//!
//! Defines the outbound gateway interface and the capabilities the host
//! application plugs into the request builder and the callback validator.

use crate::error::PlatronResult;
use crate::payments::response::GatewayResponse;
use crate::payments::types::{InitPaymentRequest, ParameterSet};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait for the outbound side of the gateway
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register a payment and obtain the URL the customer is sent to
    ///
    /// # Arguments
    /// * `request` - Order id, amount, description and optional customer hints
    ///
    /// # Returns
    /// * `GatewayResponse` - Carries `pg_payment_id` and `pg_redirect_url` on success
    async fn init_payment(&self, request: InitPaymentRequest) -> PlatronResult<GatewayResponse>;

    /// List payment systems available for `amount`, with fees applied
    async fn payment_systems(&self, amount: Decimal) -> PlatronResult<GatewayResponse>;

    /// Current status of a gateway transaction
    async fn payment_status(&self, payment_id: &str) -> PlatronResult<GatewayResponse>;

    /// Refund (fully or partially) a completed transaction
    async fn refund(&self, payment_id: &str, amount: Decimal) -> PlatronResult<GatewayResponse>;

    /// Validate the signature of an inbound callback
    ///
    /// # Arguments
    /// * `endpoint` - Path or URL the callback is addressed to; only its last segment is signed
    /// * `params` - Every inbound field, `pg_sig` included
    fn validate_callback_signature(&self, endpoint: &str, params: &ParameterSet) -> bool;
}

/// Host application hooks for result callbacks
#[async_trait]
pub trait PaymentHandler: Send + Sync {
    /// Decide whether this notification belongs to the application.
    ///
    /// Returning `false` answers the gateway with a rejection.
    async fn on_payment_request(&self, data: &ParameterSet) -> bool;

    /// Apply a successful payment. Runs inside the validator's transaction
    /// scope; an error rolls the scope back and asks the gateway to retry.
    async fn on_payment_success(&self, data: &ParameterSet) -> anyhow::Result<()>;
}

/// Opens the unit of work a payment acceptance runs in.
#[async_trait]
pub trait TransactionScope: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn ScopedTransaction>>;
}

#[async_trait]
pub trait ScopedTransaction: Send {
    async fn commit(&mut self) -> anyhow::Result<()>;

    async fn rollback(&mut self) -> anyhow::Result<()>;
}

/// Turns configured routes into the absolute URLs the gateway calls back.
pub trait UrlResolver: Send + Sync {
    fn absolute(&self, route: &str) -> PlatronResult<String>;
}

/// Source of the single-use `pg_salt` tokens.
pub trait RandomTokenSource: Send + Sync {
    fn token(&self) -> String;
}
