//! Request signing and callback verification
//!
//! Every message exchanged with Platron carries `pg_sig`: the MD5 of the
//! script name, the parameter values in key order and the merchant secret,
//! joined with `;`.

use crate::payments::types::{ParameterSet, ScriptName, SIGNATURE_KEY};
use std::fmt;
use tracing::debug;

const SEPARATOR: &str = ";";

/// Signs and verifies parameter sets with the merchant secret.
#[derive(Clone)]
pub struct SignatureCodec {
    secret: String,
}

impl fmt::Debug for SignatureCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureCodec")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SignatureCodec {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Computes the 32 char lowercase hex signature of `params` for `script`.
    ///
    /// Any `pg_sig` present in `params` is not part of the input. Null
    /// values sign as the empty string.
    pub fn sign(&self, script: &ScriptName, params: &ParameterSet) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(params.len() + 2);
        parts.push(script.as_str());
        parts.extend(
            params
                .iter()
                .filter(|(key, _)| *key != SIGNATURE_KEY)
                .map(|(_, value)| value.unwrap_or_default()),
        );
        parts.push(&self.secret);

        let digest = md5::compute(parts.join(SEPARATOR).as_bytes());
        hex::encode(digest.0)
    }

    /// Checks the `pg_sig` carried in `params` against a fresh signature.
    ///
    /// A missing `pg_sig` never verifies.
    pub fn verify(&self, script: &ScriptName, params: &ParameterSet) -> bool {
        let provided = params.get(SIGNATURE_KEY).unwrap_or_default().trim();
        let computed = self.sign(script, params);

        if computed.len() != provided.len() {
            return false;
        }

        computed
            .as_bytes()
            .iter()
            .zip(provided.as_bytes().iter())
            .fold(0, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    /// Filters empty values out of `params` and appends `pg_sig`.
    ///
    /// This is the shape every outbound request and every callback
    /// acknowledgment is sent in.
    pub fn prepare_for_transmission(&self, script: &ScriptName, params: ParameterSet) -> ParameterSet {
        let mut params = params.without_empty();
        params.remove(SIGNATURE_KEY);

        let signature = self.sign(script, &params);
        params.insert(SIGNATURE_KEY, signature);

        debug!(
            target: "platron",
            "platron_api_prepared {} {}",
            script,
            serde_json::to_string(&params).unwrap_or_default()
        );

        params
    }
}
