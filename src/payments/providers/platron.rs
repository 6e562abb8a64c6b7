//! Platron payment gateway client
//!
//! Sends form-encoded, signed requests to the gateway scripts and parses the
//! XML replies. Also builds the callback validator bound to the same
//! merchant secret.

use crate::error::{PlatronError, PlatronResult};
use crate::payments::callback::CallbackValidator;
use crate::payments::config::PlatronConfig;
use crate::payments::request::RequestBuilder;
use crate::payments::response::GatewayResponse;
use crate::payments::signature::SignatureCodec;
use crate::payments::traits::{PaymentGateway, PaymentHandler, RandomTokenSource, UrlResolver};
use crate::payments::types::{InitPaymentRequest, ParameterSet, Script, ScriptName};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use url::form_urlencoded;
use url::Url;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Platron gateway client
pub struct PlatronClient {
    config: Arc<PlatronConfig>,
    codec: SignatureCodec,
    builder: RequestBuilder,
    client: Client,
}

impl PlatronClient {
    /// Create a new client; fails if the account is not configured
    pub fn new(config: PlatronConfig) -> PlatronResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("platron-merchant/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PlatronError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let config = Arc::new(config);
        let codec = SignatureCodec::new(config.secret_key.as_str());
        let builder = RequestBuilder::from_config(config.clone())?;

        info!(
            "Platron client initialized: merchant={}, base_url={}, test_mode={}",
            config.account_id, config.base_url, config.test_mode
        );

        Ok(Self {
            config,
            codec,
            builder,
            client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> PlatronResult<Self> {
        Self::new(PlatronConfig::from_env()?)
    }

    pub fn with_token_source(mut self, tokens: Arc<dyn RandomTokenSource>) -> Self {
        self.builder = self.builder.with_token_source(tokens);
        self
    }

    pub fn config(&self) -> &PlatronConfig {
        &self.config
    }

    pub fn codec(&self) -> &SignatureCodec {
        &self.codec
    }

    pub fn with_url_resolver(mut self, urls: Arc<dyn UrlResolver>) -> Self {
        self.builder = self.builder.with_url_resolver(urls);
        self
    }

    /// Validator for result callbacks, answering for the configured result URL.
    pub fn callback_validator(&self, handler: Arc<dyn PaymentHandler>) -> CallbackValidator {
        CallbackValidator::new(self.codec.clone(), handler)
            .with_result_url(self.config.result_url.clone())
    }

    fn script_url(&self, script: Script) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), script.file_name())
    }

    /// Signs `params` for `script`, posts them and parses the reply.
    ///
    /// Non-200 replies are transport errors; replies with `pg_status` other
    /// than `ok` become `PlatronError::Gateway`.
    pub async fn call(&self, script: Script, params: ParameterSet) -> PlatronResult<GatewayResponse> {
        let prepared = self
            .codec
            .prepare_for_transmission(&ScriptName::from(script), params);
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(prepared.pairs())
            .finish();
        let url = self.script_url(script);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(
                target: "platron",
                "platron_api_http_response_error {} HTTP {}",
                script, status
            );
            return Err(PlatronError::http_status(script.file_name(), status.as_u16()));
        }

        let text = response.text().await?;
        let reply = GatewayResponse::from_xml(&text).map_err(|e| {
            error!(target: "platron", "Failed to parse {} reply: {}", script, e);
            e
        })?;

        reply.error_for_status().map_err(|e| {
            error!(target: "platron", "platron_api_response_error {}", e);
            e
        })
    }

    /// Signed browser URL of `payment.php` for the given payment.
    ///
    /// Lets the customer be sent straight to the payment page without a
    /// server-side `init_payment.php` call.
    pub fn payment_page_url(&self, request: &InitPaymentRequest) -> PlatronResult<Url> {
        let params = self.builder.build_init_payment(request)?;
        let prepared = self
            .codec
            .prepare_for_transmission(&ScriptName::from(Script::Payment), params);

        let mut url = Url::parse(&self.script_url(Script::Payment)).map_err(|e| {
            PlatronError::configuration(format!("Invalid gateway base URL: {}", e))
        })?;
        url.query_pairs_mut().extend_pairs(prepared.pairs());

        Ok(url)
    }
}

#[async_trait]
impl PaymentGateway for PlatronClient {
    async fn init_payment(&self, request: InitPaymentRequest) -> PlatronResult<GatewayResponse> {
        info!(
            "Initiating Platron payment: order_id={} amount={} {}",
            request.order_id, request.amount, self.config.currency
        );

        let params = self.builder.build_init_payment(&request)?;
        let response = self.call(Script::InitPayment, params).await?;

        info!(
            "Platron payment initiated: order_id={}, payment_id={}",
            request.order_id,
            response.payment_id().unwrap_or_default()
        );

        Ok(response)
    }

    async fn payment_systems(&self, amount: Decimal) -> PlatronResult<GatewayResponse> {
        info!("Listing Platron payment systems: amount={}", amount);
        self.call(Script::PsList, self.builder.build_ps_list(amount)).await
    }

    async fn payment_status(&self, payment_id: &str) -> PlatronResult<GatewayResponse> {
        info!("Checking Platron payment status: payment_id={}", payment_id);
        let response = self
            .call(Script::GetStatus, self.builder.build_status_query(payment_id))
            .await?;

        info!(
            "Platron payment status: payment_id={}, status={:?}",
            payment_id,
            response.transaction_status()
        );

        Ok(response)
    }

    async fn refund(&self, payment_id: &str, amount: Decimal) -> PlatronResult<GatewayResponse> {
        info!("Refunding Platron payment: payment_id={} amount={}", payment_id, amount);
        self.call(Script::Revoke, self.builder.build_refund(payment_id, amount))
            .await
    }

    fn validate_callback_signature(&self, endpoint: &str, params: &ParameterSet) -> bool {
        match ScriptName::parse(endpoint) {
            Ok(script) => self.codec.verify(&script, params),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn create_test_client() -> PlatronClient {
        let mut config = PlatronConfig::new("82", "test_secret");
        config.base_url = "https://gateway.example/".to_string();
        PlatronClient::new(config).unwrap()
    }

    #[test]
    fn test_new_requires_secret() {
        let result = PlatronClient::new(PlatronConfig::new("82", ""));
        assert!(matches!(result, Err(PlatronError::Configuration { .. })));
    }

    #[test]
    fn test_script_url() {
        let client = create_test_client();
        assert_eq!(
            client.script_url(Script::GetStatus),
            "https://gateway.example/get_status.php"
        );
    }

    #[test]
    fn test_payment_page_url_is_signed() {
        let client = create_test_client();
        let request = InitPaymentRequest::new("order-9", Decimal::from_str("3.1").unwrap(), "Tea");

        let url = client.payment_page_url(&request).unwrap();
        assert_eq!(url.path(), "/payment.php");

        let params: ParameterSet = url.query_pairs().into_owned().collect();
        assert_eq!(params.get("pg_amount"), Some("3.10"));
        assert!(client
            .codec()
            .verify(&ScriptName::from(Script::Payment), &params));
        assert!(!client
            .codec()
            .verify(&ScriptName::from(Script::InitPayment), &params));
    }

    #[test]
    fn test_callback_signature_validation_invalid() {
        let client = create_test_client();
        let params = ParameterSet::new()
            .with("pg_salt", "abc")
            .with("pg_sig", "invalid_signature");
        assert!(!client.validate_callback_signature("/platron/result", &params));
        assert!(!client.validate_callback_signature("", &params));
    }
}
