//! Parsed replies of the gateway API.

use crate::error::{PlatronError, PlatronResult};
use crate::payments::codes::{error_label_for, reject_label_for};
use crate::payments::types::{GatewayStatus, PaymentSystem, TransactionStatus};
use crate::payments::xml::{parse_document, XmlElement};
use std::collections::BTreeMap;

const STATUS_KEY: &str = "pg_status";
const ERROR_CODE_KEY: &str = "pg_error_code";
const ERROR_DESCRIPTION_KEY: &str = "pg_error_description";

/// Reply of one outbound call. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: GatewayStatus,
    pub error_code: Option<u32>,
    pub error_description: Option<String>,
    /// Leaf fields of the root element other than status and error fields
    pub payload: BTreeMap<String, String>,
    document: XmlElement,
}

impl GatewayResponse {
    pub fn from_xml(xml: &str) -> PlatronResult<Self> {
        let document = parse_document(xml)?;

        let raw_status = document
            .child_text(STATUS_KEY)
            .ok_or_else(|| PlatronError::xml("reply has no pg_status"))?;
        let status = GatewayStatus::parse(raw_status)
            .ok_or_else(|| PlatronError::xml(format!("unexpected pg_status {:?}", raw_status)))?;

        let error_code = document
            .child_text(ERROR_CODE_KEY)
            .and_then(|code| code.parse().ok());
        let error_description = document
            .child_text(ERROR_DESCRIPTION_KEY)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let payload = document
            .children
            .iter()
            .filter(|c| c.is_leaf())
            .filter(|c| !matches!(c.name.as_str(), STATUS_KEY | ERROR_CODE_KEY | ERROR_DESCRIPTION_KEY))
            .map(|c| (c.name.clone(), c.text.trim().to_string()))
            .collect();

        Ok(Self {
            status,
            error_code,
            error_description,
            payload,
            document,
        })
    }

    pub fn is_ok(&self) -> bool {
        self.status == GatewayStatus::Ok
    }

    /// Turns a non-`ok` reply into `PlatronError::Gateway`.
    pub fn error_for_status(self) -> PlatronResult<Self> {
        if self.is_ok() {
            return Ok(self);
        }

        Err(PlatronError::Gateway {
            status: self.status.to_string(),
            code: self.error_code,
            label: self.error_code_label(),
            description: self.error_description.unwrap_or_default(),
        })
    }

    pub fn error_code_label(&self) -> Option<&'static str> {
        self.document
            .child_text(ERROR_CODE_KEY)
            .and_then(error_label_for)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.payload.get(key).map(String::as_str)
    }

    pub fn document(&self) -> &XmlElement {
        &self.document
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.get("pg_payment_id")
    }

    pub fn redirect_url(&self) -> Option<&str> {
        self.get("pg_redirect_url")
    }

    pub fn transaction_status(&self) -> Option<TransactionStatus> {
        self.get("pg_transaction_status").map(TransactionStatus::from)
    }

    /// Label of `pg_failure_code` for rejected or failed transactions.
    pub fn failure_label(&self) -> Option<&'static str> {
        self.get("pg_failure_code").and_then(reject_label_for)
    }

    /// Entries of a `ps_list.php` reply.
    pub fn payment_systems(&self) -> Vec<PaymentSystem> {
        self.document
            .children_named("pg_payment_system")
            .map(|entry| {
                let fields: BTreeMap<String, String> = entry
                    .children
                    .iter()
                    .filter(|c| c.is_leaf())
                    .map(|c| (c.name.clone(), c.text.trim().to_string()))
                    .collect();
                let field = |key: &str| fields.get(key).filter(|v| !v.is_empty()).cloned();

                PaymentSystem {
                    name: field("pg_name").unwrap_or_default(),
                    description: field("pg_description"),
                    amount_to_pay: field("pg_amount_to_pay"),
                    amount_to_pay_currency: field("pg_amount_to_pay_currency"),
                    fields: fields.clone(),
                }
            })
            .collect()
    }
}
