//! Stock implementations of the host hooks.

use crate::payments::traits::{PaymentHandler, ScopedTransaction, TransactionScope};
use crate::payments::types::ParameterSet;
use async_trait::async_trait;
use tracing::info;

/// Scope for hosts without transactional storage; commit and rollback do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransaction;

#[async_trait]
impl TransactionScope for NoTransaction {
    async fn begin(&self) -> anyhow::Result<Box<dyn ScopedTransaction>> {
        Ok(Box::new(NoTransaction))
    }
}

#[async_trait]
impl ScopedTransaction for NoTransaction {
    async fn commit(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn rollback(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Claims every notification that names an order and records acceptance in the log.
///
/// Used by the bundled server binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPaymentHandler;

#[async_trait]
impl PaymentHandler for LoggingPaymentHandler {
    async fn on_payment_request(&self, data: &ParameterSet) -> bool {
        data.get("pg_order_id").is_some()
    }

    async fn on_payment_success(&self, data: &ParameterSet) -> anyhow::Result<()> {
        info!(
            "Payment accepted: order_id={}, payment_id={}, amount={} {}",
            data.get("pg_order_id").unwrap_or_default(),
            data.get("pg_payment_id").unwrap_or_default(),
            data.get("pg_amount").unwrap_or_default(),
            data.get("pg_currency").unwrap_or_default()
        );
        Ok(())
    }
}
