//! Merchant account configuration

use crate::error::{PlatronError, PlatronResult};
use std::fmt;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.platron.ru";
pub const DEFAULT_CURRENCY: &str = "RUB";

/// Platron merchant account configuration
#[derive(Clone)]
pub struct PlatronConfig {
    /// Merchant id (`pg_merchant_id`)
    pub account_id: String,
    /// Shared secret used for every signature
    pub secret_key: String,
    /// Send `pg_testing_mode=1`
    pub test_mode: bool,
    /// Possible values: RUB, USD, EUR
    pub currency: String,
    /// Gateway base URL, scripts are appended to it
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Public base URL of the merchant site, used to absolutize relative routes
    pub site_url: Option<String>,

    pub result_url: Option<String>,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
    /// Page where the gateway checks whether the order can still be paid
    pub check_url: Option<String>,
    pub refund_url: Option<String>,
    pub capture_url: Option<String>,
    /// Page where the customer waits for the payment system response
    pub state_url: Option<String>,
    /// Page the customer returns to after a cash payment
    pub site_return_url: Option<String>,

    /// Method of merchant -> gateway calls
    pub request_method: String,
    /// Method the state URL is reached with
    pub state_url_method: String,
    pub success_url_method: String,
    pub failure_url_method: String,
}

impl fmt::Debug for PlatronConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatronConfig")
            .field("account_id", &self.account_id)
            .field("secret_key", &"<redacted>")
            .field("test_mode", &self.test_mode)
            .field("currency", &self.currency)
            .field("base_url", &self.base_url)
            .field("site_url", &self.site_url)
            .field("result_url", &self.result_url)
            .finish_non_exhaustive()
    }
}

impl Default for PlatronConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            secret_key: String::new(),
            test_mode: false,
            currency: DEFAULT_CURRENCY.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            site_url: None,
            result_url: None,
            success_url: None,
            failure_url: None,
            check_url: None,
            refund_url: None,
            capture_url: None,
            state_url: None,
            site_return_url: None,
            request_method: "POST".to_string(),
            state_url_method: "AUTOPOST".to_string(),
            success_url_method: "AUTOGET".to_string(),
            failure_url_method: "AUTOGET".to_string(),
        }
    }
}

impl PlatronConfig {
    pub fn new(account_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            secret_key: secret_key.into(),
            ..Default::default()
        }
    }

    /// Create config from `PLATRON_*` environment variables
    pub fn from_env() -> PlatronResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> PlatronResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let account_id = var("PLATRON_ACCOUNT_ID").ok_or_else(|| {
            PlatronError::configuration("PLATRON_ACCOUNT_ID environment variable is required")
        })?;
        let secret_key = var("PLATRON_SECRET_KEY").ok_or_else(|| {
            PlatronError::configuration("PLATRON_SECRET_KEY environment variable is required")
        })?;

        let test_mode = var("PLATRON_TEST_MODE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.test_mode);

        let timeout_secs = match var("PLATRON_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| {
                PlatronError::configuration("PLATRON_TIMEOUT_SECS must be a valid number")
            })?,
            None => defaults.timeout_secs,
        };

        let config = Self {
            account_id,
            secret_key,
            test_mode,
            currency: var("PLATRON_CURRENCY").unwrap_or(defaults.currency),
            base_url: var("PLATRON_BASE_URL").unwrap_or(defaults.base_url),
            timeout_secs,
            site_url: var("PLATRON_SITE_URL"),
            result_url: var("PLATRON_RESULT_URL"),
            success_url: var("PLATRON_SUCCESS_URL"),
            failure_url: var("PLATRON_FAILURE_URL"),
            check_url: var("PLATRON_CHECK_URL"),
            refund_url: var("PLATRON_REFUND_URL"),
            capture_url: var("PLATRON_CAPTURE_URL"),
            state_url: var("PLATRON_STATE_URL"),
            site_return_url: var("PLATRON_SITE_RETURN_URL"),
            request_method: var("PLATRON_REQUEST_METHOD").unwrap_or(defaults.request_method),
            state_url_method: var("PLATRON_STATE_URL_METHOD").unwrap_or(defaults.state_url_method),
            success_url_method: var("PLATRON_SUCCESS_URL_METHOD")
                .unwrap_or(defaults.success_url_method),
            failure_url_method: var("PLATRON_FAILURE_URL_METHOD")
                .unwrap_or(defaults.failure_url_method),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlatronResult<()> {
        if self.account_id.trim().is_empty() {
            return Err(PlatronError::configuration("accountId required."));
        }

        if self.secret_key.trim().is_empty() {
            return Err(PlatronError::configuration("secretKey required."));
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PlatronError::configuration(format!(
                "Currency must be a three letter code, got {}",
                self.currency
            )));
        }

        Url::parse(&self.base_url).map_err(|e| {
            PlatronError::configuration(format!("Invalid gateway base URL {}: {}", self.base_url, e))
        })?;

        if let Some(site_url) = &self.site_url {
            Url::parse(site_url).map_err(|e| {
                PlatronError::configuration(format!("Invalid site URL {}: {}", site_url, e))
            })?;
        }

        if self.timeout_secs == 0 {
            return Err(PlatronError::configuration("Timeout must be greater than 0"));
        }

        Ok(())
    }
}
