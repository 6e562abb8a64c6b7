//! Platron protocol types and data structures
//!
//! Parameter sets, script names and the request/response shapes shared by the
//! outbound client and the inbound callback validator.

use crate::error::{PlatronError, PlatronResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Key under which the signature travels.
pub const SIGNATURE_KEY: &str = "pg_sig";

/// Key/value parameters of a gateway request, response or callback.
///
/// Keys are kept in byte order, which is the order the signature is computed
/// in. A `None` value is a field the builder knows about but has nothing for;
/// it is dropped before signing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, Option<String>>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), Some(value.into()));
    }

    pub fn insert_opt<V: Into<String>>(&mut self, key: impl Into<String>, value: Option<V>) {
        self.0.insert(key.into(), value.map(Into::into));
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_opt<V: Into<String>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert_opt(key, value);
        self
    }

    /// Value for `key`; a present-but-null entry reads as `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key).flatten()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Entries in key order, nulls included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Non-null entries in key order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    /// Drops every key whose value is null or the empty string.
    pub fn without_empty(self) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|(_, value)| value.as_deref().is_some_and(|v| !v.is_empty()))
                .collect(),
        )
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        )
    }
}

impl From<HashMap<String, String>> for ParameterSet {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

/// Gateway scripts the merchant talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    InitPayment,
    /// Browser-facing payment page, reached by redirect rather than a server call.
    Payment,
    PsList,
    GetStatus,
    Revoke,
}

impl Script {
    pub fn file_name(&self) -> &'static str {
        match self {
            Script::InitPayment => "init_payment.php",
            Script::Payment => "payment.php",
            Script::PsList => "ps_list.php",
            Script::GetStatus => "get_status.php",
            Script::Revoke => "revoke.php",
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Final path segment of an endpoint, the first element of every signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptName(String);

impl ScriptName {
    /// Extracts the basename from a script name, path or full URL.
    ///
    /// Query string and fragment are ignored, as is a trailing slash. An
    /// endpoint with no usable segment is rejected.
    pub fn parse(endpoint: &str) -> PlatronResult<Self> {
        let path = endpoint.split(['?', '#']).next().unwrap_or_default();
        let name = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();

        if name.is_empty() {
            return Err(PlatronError::invalid_script(endpoint));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Script> for ScriptName {
    fn from(script: Script) -> Self {
        Self(script.file_name().to_string())
    }
}

impl fmt::Display for ScriptName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inputs for `init_payment.php` (and the `payment.php` redirect).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitPaymentRequest {
    /// Merchant-side order/invoice identifier
    pub order_id: String,
    pub amount: Decimal,
    pub description: String,
    /// Preselected payment system code, if any
    pub payment_system: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub cancel_url: Option<String>,
}

impl InitPaymentRequest {
    pub fn new(order_id: impl Into<String>, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            amount,
            description: description.into(),
            payment_system: None,
            phone: None,
            email: None,
            cancel_url: None,
        }
    }

    pub fn payment_system(mut self, system: impl Into<String>) -> Self {
        self.payment_system = Some(system.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn cancel_url(mut self, url: impl Into<String>) -> Self {
        self.cancel_url = Some(url.into());
        self
    }
}

/// `pg_status` of a gateway reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    Ok,
    Error,
    Rejected,
}

impl GatewayStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "ok" => Some(Self::Ok),
            "error" => Some(Self::Error),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `pg_transaction_status` reported by `get_status.php`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Partial,
    Pending,
    Ok,
    Failed,
    Revoked,
    Refunded,
    Unknown(String),
}

impl From<&str> for TransactionStatus {
    fn from(value: &str) -> Self {
        match value.trim() {
            "partial" => Self::Partial,
            "pending" => Self::Pending,
            "ok" => Self::Ok,
            "failed" => Self::Failed,
            "revoked" => Self::Revoked,
            "refunded" => Self::Refunded,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// One entry of the `ps_list.php` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSystem {
    pub name: String,
    pub description: Option<String>,
    pub amount_to_pay: Option<String>,
    pub amount_to_pay_currency: Option<String>,
    /// Every leaf field of the entry, including the ones above
    pub fields: BTreeMap<String, String>,
}

/// `pg_status` of the acknowledgment sent back for a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Where a callback ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackState {
    /// Signature did not match; business logic never ran
    SignatureInvalid,
    /// Nobody claimed the notification, or it reported a failed payment
    NoHandler,
    /// Host accepted the payment and committed its work
    Accepted,
    /// Host acceptance failed; the gateway will redeliver
    ProcessingFailed,
}

/// Result of a processed callback, consumed to answer the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub state: CallbackState,
    pub accepted: bool,
    pub response_status: ResponseStatus,
    pub description: String,
    /// Signed parameters of the acknowledgment, `pg_sig` included
    pub acknowledgment: ParameterSet,
}
