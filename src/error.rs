use crate::payments::types::CallbackState;
use thiserror::Error;

pub type PlatronResult<T> = Result<T, PlatronError>;

#[derive(Debug, Error)]
pub enum PlatronError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid script name: {script:?}")]
    InvalidScript { script: String },

    #[error("Signature mismatch for callback on {script}")]
    SignatureMismatch { script: String },

    #[error("Transport error calling {script}: {message}")]
    Transport {
        script: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Gateway returned {status}: {} : {description}", .label.unwrap_or("unknown error"))]
    Gateway {
        status: String,
        code: Option<u32>,
        label: Option<&'static str>,
        description: String,
    },

    #[error("XML error: {message}")]
    Xml { message: String },

    #[error("Payment processing error: {message}")]
    Processing { message: String },
}

impl PlatronError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_script(script: impl Into<String>) -> Self {
        Self::InvalidScript {
            script: script.into(),
        }
    }

    pub fn signature_mismatch(script: impl Into<String>) -> Self {
        Self::SignatureMismatch {
            script: script.into(),
        }
    }

    pub fn transport(script: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            script: script.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn http_status(script: impl Into<String>, status: u16) -> Self {
        Self::Transport {
            script: script.into(),
            status: Some(status),
            message: format!("Api http error: {}", status),
        }
    }

    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing {
            message: message.into(),
        }
    }

    /// HTTP status the result endpoint answers with when this error escapes.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SignatureMismatch { .. } => 403,
            Self::Transport { .. } | Self::Processing { .. } => 503,
            _ => 500,
        }
    }

    /// Terminal callback state for errors raised while processing a callback.
    pub fn callback_state(&self) -> Option<CallbackState> {
        match self {
            Self::SignatureMismatch { .. } => Some(CallbackState::SignatureInvalid),
            Self::Processing { .. } => Some(CallbackState::ProcessingFailed),
            _ => None,
        }
    }

    /// Errors the gateway resolves by re-delivering the same callback.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Processing { .. })
    }
}

impl From<reqwest::Error> for PlatronError {
    fn from(err: reqwest::Error) -> Self {
        let script = err
            .url()
            .and_then(|url| url.path_segments())
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("unknown")
            .to_string();

        if err.is_timeout() {
            Self::transport(script, "request timed out")
        } else {
            Self::Transport {
                script,
                status: err.status().map(|s| s.as_u16()),
                message: format!("Request error: {}", err),
            }
        }
    }
}

impl From<quick_xml::Error> for PlatronError {
    fn from(err: quick_xml::Error) -> Self {
        Self::xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PlatronError::signature_mismatch("result").status_code(), 403);
        assert_eq!(PlatronError::processing("db down").status_code(), 503);
        assert_eq!(PlatronError::http_status("init_payment.php", 502).status_code(), 503);
        assert_eq!(PlatronError::configuration("missing").status_code(), 500);
    }

    #[test]
    fn test_callback_state() {
        assert_eq!(
            PlatronError::signature_mismatch("result").callback_state(),
            Some(CallbackState::SignatureInvalid)
        );
        assert_eq!(
            PlatronError::processing("db down").callback_state(),
            Some(CallbackState::ProcessingFailed)
        );
        assert_eq!(PlatronError::xml("bad").callback_state(), None);
    }

    #[test]
    fn test_retryable() {
        assert!(PlatronError::processing("boom").is_retryable());
        assert!(!PlatronError::signature_mismatch("result").is_retryable());
    }

    #[test]
    fn test_gateway_display_unknown_label() {
        let err = PlatronError::Gateway {
            status: "error".to_string(),
            code: Some(9999),
            label: None,
            description: "strange".to_string(),
        };
        assert_eq!(err.to_string(), "Gateway returned error: unknown error : strange");
    }
}
