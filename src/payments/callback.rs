//! Inbound result callbacks
//!
//! The gateway POSTs a signed notification to the merchant's result URL and
//! expects a signed `<response>` back. A bad signature stops processing
//! before any host code runs; a failure while accepting the payment is
//! reported as retryable so the gateway delivers the callback again.

use crate::error::{PlatronError, PlatronResult};
use crate::payments::codes::reject_label_for;
use crate::payments::handler::NoTransaction;
use crate::payments::signature::SignatureCodec;
use crate::payments::traits::{PaymentHandler, TransactionScope};
use crate::payments::types::{CallbackOutcome, CallbackState, ParameterSet, ResponseStatus, ScriptName};
use crate::payments::xml::render_response;
use std::sync::Arc;
use tracing::{error, info, warn};

/// `pg_result` of a successful payment
pub const RESULT_OK: &str = "1";

const ACCEPTED_DESCRIPTION: &str = "Payment accepted";
const REJECTED_DESCRIPTION: &str = "Payment not accepted";

pub struct CallbackValidator {
    codec: SignatureCodec,
    handler: Arc<dyn PaymentHandler>,
    scope: Arc<dyn TransactionScope>,
    result_url: Option<String>,
}

impl CallbackValidator {
    pub fn new(codec: SignatureCodec, handler: Arc<dyn PaymentHandler>) -> Self {
        Self {
            codec,
            handler,
            scope: Arc::new(NoTransaction),
            result_url: None,
        }
    }

    pub fn with_transaction_scope(mut self, scope: Arc<dyn TransactionScope>) -> Self {
        self.scope = scope;
        self
    }

    /// Fixes the endpoint identity instead of trusting the URL a callback arrives on.
    ///
    /// Must name the same script as the `pg_result_url` sent with the payment.
    pub fn with_result_url(mut self, result_url: Option<String>) -> Self {
        self.result_url = result_url;
        self
    }

    /// Endpoint the callback is verified and answered for.
    pub fn endpoint<'a>(&'a self, request_url: &'a str) -> &'a str {
        self.result_url.as_deref().unwrap_or(request_url)
    }

    /// Verifies a result callback, lets the host accept it and builds the acknowledgment.
    ///
    /// # Errors
    /// * `SignatureMismatch` - `pg_sig` does not match; reply with 403
    /// * `Processing` - the host failed to accept the payment; reply with 503
    pub async fn process(&self, request_url: &str, data: ParameterSet) -> PlatronResult<CallbackOutcome> {
        let script = ScriptName::parse(self.endpoint(request_url))?;
        let payload = serde_json::to_string(&data).unwrap_or_default();

        if !self.codec.verify(&script, &data) {
            warn!(target: "platron", "platron_api_check_hash_error {} {}", script, payload);
            return Err(PlatronError::signature_mismatch(script.as_str()));
        }

        let salt = data.get("pg_salt").map(str::to_string);
        let handled = self.handler.on_payment_request(&data).await;
        let paid = data.get("pg_result").map(str::trim) == Some(RESULT_OK);

        if handled && paid {
            self.accept(&data).await?;
            info!(target: "platron", "platron_api_payment_accept {}", payload);
            return Ok(self.outcome(&script, CallbackState::Accepted, salt));
        }

        if !paid {
            let reason = data
                .get("pg_failure_code")
                .and_then(reject_label_for)
                .or(data.get("pg_failure_description"))
                .unwrap_or("no reason given");
            info!(
                target: "platron",
                "Payment not successful: order_id={}, reason={}",
                data.get("pg_order_id").unwrap_or_default(),
                reason
            );
        } else {
            info!(
                target: "platron",
                "Callback not handled: order_id={}",
                data.get("pg_order_id").unwrap_or_default()
            );
        }

        Ok(self.outcome(&script, CallbackState::NoHandler, salt))
    }

    async fn accept(&self, data: &ParameterSet) -> PlatronResult<()> {
        let mut transaction = self.scope.begin().await.map_err(|e| {
            error!(target: "platron", "platron_api_error_processing Failed to begin transaction: {}", e);
            PlatronError::processing(e.to_string())
        })?;

        match self.handler.on_payment_success(data).await {
            Ok(()) => transaction.commit().await.map_err(|e| {
                error!(target: "platron", "platron_api_error_processing Failed to commit: {}", e);
                PlatronError::processing(e.to_string())
            }),
            Err(e) => {
                if let Err(rollback_error) = transaction.rollback().await {
                    warn!(target: "platron", "Rollback failed: {}", rollback_error);
                }
                error!(target: "platron", "platron_api_error_processing Payment processing error: {}", e);
                Err(PlatronError::processing(e.to_string()))
            }
        }
    }

    fn outcome(&self, script: &ScriptName, state: CallbackState, salt: Option<String>) -> CallbackOutcome {
        let (response_status, description) = match state {
            CallbackState::Accepted => (ResponseStatus::Ok, ACCEPTED_DESCRIPTION),
            _ => (ResponseStatus::Error, REJECTED_DESCRIPTION),
        };

        let acknowledgment = ParameterSet::new()
            .with("pg_status", response_status.as_str())
            .with_opt("pg_salt", salt)
            .with("pg_description", description);

        CallbackOutcome {
            state,
            accepted: state == CallbackState::Accepted,
            response_status,
            description: description.to_string(),
            acknowledgment: self.codec.prepare_for_transmission(script, acknowledgment),
        }
    }
}

impl CallbackOutcome {
    /// XML body sent back to the gateway.
    pub fn to_xml(&self) -> PlatronResult<String> {
        render_response(&self.acknowledgment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::traits::ScopedTransaction;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const SECRET: &str = "callback-secret";
    const RESULT_PATH: &str = "/platron/result";

    struct StubHandler {
        handled: bool,
        fail: bool,
        successes: AtomicUsize,
    }

    impl StubHandler {
        fn new(handled: bool, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                handled,
                fail,
                successes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PaymentHandler for StubHandler {
        async fn on_payment_request(&self, _data: &ParameterSet) -> bool {
            self.handled
        }

        async fn on_payment_success(&self, _data: &ParameterSet) -> anyhow::Result<()> {
            self.successes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("order storage unavailable");
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingScope {
        events: Arc<Mutex<Vec<&'static str>>>,
        fail_commit: bool,
    }

    struct RecordingTransaction {
        events: Arc<Mutex<Vec<&'static str>>>,
        fail_commit: bool,
    }

    #[async_trait]
    impl TransactionScope for RecordingScope {
        async fn begin(&self) -> anyhow::Result<Box<dyn ScopedTransaction>> {
            self.events.lock().unwrap().push("begin");
            Ok(Box::new(RecordingTransaction {
                events: self.events.clone(),
                fail_commit: self.fail_commit,
            }))
        }
    }

    #[async_trait]
    impl ScopedTransaction for RecordingTransaction {
        async fn commit(&mut self) -> anyhow::Result<()> {
            self.events.lock().unwrap().push("commit");
            if self.fail_commit {
                anyhow::bail!("serialization failure");
            }
            Ok(())
        }

        async fn rollback(&mut self) -> anyhow::Result<()> {
            self.events.lock().unwrap().push("rollback");
            Ok(())
        }
    }

    fn codec() -> SignatureCodec {
        SignatureCodec::new(SECRET)
    }

    fn signed_callback(result: &str) -> ParameterSet {
        let params = ParameterSet::new()
            .with("pg_order_id", "order-1")
            .with("pg_payment_id", "15826")
            .with("pg_amount", "10.50")
            .with("pg_currency", "RUB")
            .with("pg_result", result)
            .with("pg_salt", "inbound-salt");
        codec().prepare_for_transmission(&ScriptName::parse(RESULT_PATH).unwrap(), params)
    }

    #[tokio::test]
    async fn test_accepted_callback() {
        let handler = StubHandler::new(true, false);
        let scope = RecordingScope::default();
        let events = scope.events.clone();
        let validator = CallbackValidator::new(codec(), handler.clone())
            .with_transaction_scope(Arc::new(scope));

        let outcome = validator.process(RESULT_PATH, signed_callback("1")).await.unwrap();

        assert_eq!(outcome.state, CallbackState::Accepted);
        assert!(outcome.accepted);
        assert_eq!(outcome.response_status, ResponseStatus::Ok);
        assert_eq!(outcome.acknowledgment.get("pg_status"), Some("ok"));
        assert_eq!(outcome.acknowledgment.get("pg_salt"), Some("inbound-salt"));
        assert!(codec().verify(&ScriptName::parse("result").unwrap(), &outcome.acknowledgment));
        assert_eq!(handler.successes.load(Ordering::SeqCst), 1);
        assert_eq!(*events.lock().unwrap(), vec!["begin", "commit"]);
    }

    #[tokio::test]
    async fn test_tampered_amount_is_rejected() {
        let handler = StubHandler::new(true, false);
        let validator = CallbackValidator::new(codec(), handler.clone());

        let mut data = signed_callback("1");
        data.insert("pg_amount", "1000.00");

        let result = validator.process(RESULT_PATH, data).await;
        assert!(matches!(result, Err(PlatronError::SignatureMismatch { .. })));
        assert_eq!(handler.successes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_payment_falls_through_to_rejection() {
        let handler = StubHandler::new(true, false);
        let validator = CallbackValidator::new(codec(), handler.clone());

        let outcome = validator.process(RESULT_PATH, signed_callback("0")).await.unwrap();

        assert_eq!(outcome.state, CallbackState::NoHandler);
        assert!(!outcome.accepted);
        assert_eq!(outcome.acknowledgment.get("pg_status"), Some("error"));
        assert_eq!(outcome.description, "Payment not accepted");
        assert_eq!(handler.successes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unhandled_callback_is_rejected() {
        let validator = CallbackValidator::new(codec(), StubHandler::new(false, false));
        let outcome = validator.process(RESULT_PATH, signed_callback("1")).await.unwrap();
        assert_eq!(outcome.response_status, ResponseStatus::Error);
    }

    #[tokio::test]
    async fn test_processing_failure_rolls_back() {
        let scope = RecordingScope::default();
        let events = scope.events.clone();
        let validator = CallbackValidator::new(codec(), StubHandler::new(true, true))
            .with_transaction_scope(Arc::new(scope));

        let result = validator.process(RESULT_PATH, signed_callback("1")).await;

        match result {
            Err(e @ PlatronError::Processing { .. }) => assert!(e.is_retryable()),
            other => panic!("expected processing error, got {:?}", other),
        }
        assert_eq!(*events.lock().unwrap(), vec!["begin", "rollback"]);
    }

    #[tokio::test]
    async fn test_commit_failure_is_processing_error() {
        let handler = StubHandler::new(true, false);
        let scope = RecordingScope {
            fail_commit: true,
            ..Default::default()
        };
        let events = scope.events.clone();
        let validator = CallbackValidator::new(codec(), handler.clone())
            .with_transaction_scope(Arc::new(scope));

        let err = validator
            .process(RESULT_PATH, signed_callback("1"))
            .await
            .unwrap_err();

        assert!(matches!(err, PlatronError::Processing { .. }));
        assert_eq!(err.status_code(), 503);
        assert_eq!(handler.successes.load(Ordering::SeqCst), 1);
        assert_eq!(*events.lock().unwrap(), vec!["begin", "commit"]);
    }

    #[tokio::test]
    async fn test_rejection_ack_is_signed_for_same_script() {
        let scope = RecordingScope::default();
        let events = scope.events.clone();
        let validator = CallbackValidator::new(codec(), StubHandler::new(true, false))
            .with_transaction_scope(Arc::new(scope));

        let outcome = validator.process(RESULT_PATH, signed_callback("0")).await.unwrap();

        assert_eq!(outcome.acknowledgment.get("pg_status"), Some("error"));
        assert_eq!(outcome.acknowledgment.get("pg_salt"), Some("inbound-salt"));
        assert!(codec().verify(&ScriptName::parse(RESULT_PATH).unwrap(), &outcome.acknowledgment));
        assert!(!codec().verify(&ScriptName::parse("check").unwrap(), &outcome.acknowledgment));
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_configured_result_url_wins() {
        let validator = CallbackValidator::new(codec(), StubHandler::new(true, false))
            .with_result_url(Some("https://shop.example/platron/result".to_string()));

        assert_eq!(validator.endpoint("/some/other/path"), "https://shop.example/platron/result");
        let outcome = validator
            .process("/some/other/path", signed_callback("1"))
            .await
            .unwrap();
        assert!(outcome.accepted);
    }

    #[tokio::test]
    async fn test_outcome_renders_xml() {
        let validator = CallbackValidator::new(codec(), StubHandler::new(true, false));
        let outcome = validator.process(RESULT_PATH, signed_callback("1")).await.unwrap();
        let xml = outcome.to_xml().unwrap();
        assert!(xml.contains("<pg_status>ok</pg_status>"));
        assert!(xml.contains("<pg_sig>"));
    }
}
