//! Parameter sets of the outbound gateway operations
//!
//! Builders only assemble fields; filtering and signing happen in
//! `SignatureCodec::prepare_for_transmission`.

use crate::error::{PlatronError, PlatronResult};
use crate::payments::config::PlatronConfig;
use crate::payments::traits::{RandomTokenSource, UrlResolver};
use crate::payments::types::{InitPaymentRequest, ParameterSet};
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use url::Url;

/// Renders an amount with two decimals and `.` as separator, half away from zero.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Resolves routes against the merchant site's public base URL.
///
/// Absolute URLs pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct SiteUrlResolver {
    base: Option<Url>,
}

impl SiteUrlResolver {
    pub fn new(base: Option<&str>) -> PlatronResult<Self> {
        let base = base
            .map(|b| {
                Url::parse(b).map_err(|e| {
                    PlatronError::configuration(format!("Invalid site URL {}: {}", b, e))
                })
            })
            .transpose()?;
        Ok(Self { base })
    }
}

impl UrlResolver for SiteUrlResolver {
    fn absolute(&self, route: &str) -> PlatronResult<String> {
        if let Ok(url) = Url::parse(route) {
            return Ok(url.to_string());
        }

        let base = self.base.as_ref().ok_or_else(|| {
            PlatronError::configuration(format!(
                "Cannot make {} absolute without a configured site URL",
                route
            ))
        })?;

        base.join(route).map(|url| url.to_string()).map_err(|e| {
            PlatronError::configuration(format!("Invalid route {}: {}", route, e))
        })
    }
}

/// Salts of 16 random bytes, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandomTokens;

impl RandomTokenSource for OsRandomTokens {
    fn token(&self) -> String {
        let bytes: [u8; 16] = rand::random();
        hex::encode(bytes)
    }
}

/// Builds the parameter sets of the four outbound operations.
#[derive(Clone)]
pub struct RequestBuilder {
    config: Arc<PlatronConfig>,
    urls: Arc<dyn UrlResolver>,
    tokens: Arc<dyn RandomTokenSource>,
}

impl RequestBuilder {
    pub fn new(
        config: Arc<PlatronConfig>,
        urls: Arc<dyn UrlResolver>,
        tokens: Arc<dyn RandomTokenSource>,
    ) -> Self {
        Self {
            config,
            urls,
            tokens,
        }
    }

    /// Builder with the site URL resolver and OS randomness.
    pub fn from_config(config: Arc<PlatronConfig>) -> PlatronResult<Self> {
        let urls = SiteUrlResolver::new(config.site_url.as_deref())?;
        Ok(Self::new(config, Arc::new(urls), Arc::new(OsRandomTokens)))
    }

    pub fn with_token_source(mut self, tokens: Arc<dyn RandomTokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_url_resolver(mut self, urls: Arc<dyn UrlResolver>) -> Self {
        self.urls = urls;
        self
    }

    pub fn config(&self) -> &PlatronConfig {
        &self.config
    }

    fn absolute(&self, route: &Option<String>) -> PlatronResult<Option<String>> {
        route.as_deref().map(|r| self.urls.absolute(r)).transpose()
    }

    fn method(value: &str) -> Option<&str> {
        Some(value).filter(|v| !v.is_empty())
    }

    /// Fields of `init_payment.php`; the same set signs a `payment.php` redirect.
    pub fn build_init_payment(&self, request: &InitPaymentRequest) -> PlatronResult<ParameterSet> {
        let config = &self.config;

        let params = ParameterSet::new()
            .with("pg_merchant_id", config.account_id.as_str())
            .with("pg_description", request.description.as_str())
            .with("pg_amount", format_amount(request.amount))
            .with("pg_salt", self.tokens.token())
            .with("pg_order_id", request.order_id.as_str())
            .with("pg_currency", config.currency.as_str())
            .with_opt("pg_check_url", self.absolute(&config.check_url)?)
            .with_opt("pg_result_url", self.absolute(&config.result_url)?)
            .with_opt("pg_refund_url", self.absolute(&config.refund_url)?)
            .with_opt("pg_capture_url", self.absolute(&config.capture_url)?)
            .with_opt("pg_success_url", self.absolute(&config.success_url)?)
            .with_opt("pg_failure_url", self.absolute(&config.failure_url)?)
            .with_opt("pg_site_url", self.absolute(&config.site_return_url)?)
            .with_opt("pg_request_method", Self::method(&config.request_method))
            .with_opt("pg_success_url_method", Self::method(&config.success_url_method))
            .with_opt("pg_failure_url_method", Self::method(&config.failure_url_method))
            .with_opt("pg_state_url", self.absolute(&config.state_url)?)
            .with_opt("pg_state_url_method", Self::method(&config.state_url_method))
            .with_opt("pg_payment_system", request.payment_system.clone())
            .with("pg_lifetime", "")
            .with("pg_encoding", "")
            .with_opt("pg_user_phone", request.phone.clone())
            .with_opt("pg_user_contact_email", request.email.clone())
            .with("pg_testing_mode", flag(config.test_mode))
            .with_opt("cancel_url", request.cancel_url.clone());

        Ok(params)
    }

    pub fn build_ps_list(&self, amount: Decimal) -> ParameterSet {
        ParameterSet::new()
            .with("pg_merchant_id", self.config.account_id.as_str())
            .with("pg_amount", format_amount(amount))
            .with("pg_salt", self.tokens.token())
            .with("pg_currency", self.config.currency.as_str())
            .with("pg_testing_mode", flag(self.config.test_mode))
    }

    pub fn build_status_query(&self, payment_id: &str) -> ParameterSet {
        ParameterSet::new()
            .with("pg_merchant_id", self.config.account_id.as_str())
            .with("pg_payment_id", payment_id)
            .with("pg_salt", self.tokens.token())
            .with("pg_testing_mode", flag(self.config.test_mode))
    }

    pub fn build_refund(&self, payment_id: &str, amount: Decimal) -> ParameterSet {
        ParameterSet::new()
            .with("pg_merchant_id", self.config.account_id.as_str())
            .with("pg_payment_id", payment_id)
            .with("pg_refund_amount", format_amount(amount))
            .with("pg_salt", self.tokens.token())
            .with("pg_testing_mode", flag(self.config.test_mode))
    }
}
