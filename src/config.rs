use crate::payments::config::PlatronConfig;
use anyhow::{anyhow, Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub result: ResultEndpointConfig,
    pub platron: PlatronConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

#[derive(Debug, Clone)]
pub struct ResultEndpointConfig {
    /// Route the gateway posts result callbacks to
    pub path: String,
    /// Swallow signature/processing errors instead of answering 403/503
    pub silent: bool,
    /// Where to send the client after a swallowed error
    pub redirect_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .context("PORT not set")?
                .parse()
                .context("PORT must be a valid number")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };

        let result = ResultEndpointConfig {
            path: env::var("RESULT_PATH").unwrap_or_else(|_| "/platron/result".to_string()),
            silent: env::var("RESULT_SILENT")
                .map(|v| matches!(v.trim(), "1" | "true"))
                .unwrap_or(false),
            redirect_url: env::var("RESULT_REDIRECT_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        };

        let platron = PlatronConfig::from_env().context("Platron account configuration")?;

        let config = Config {
            server,
            result,
            platron,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Validate port range
        if self.server.port < 1024 {
            return Err(anyhow!(
                "Port must be at least 1024, got {}",
                self.server.port
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.server.environment.as_str()) {
            return Err(anyhow!(
                "Environment must be one of: {:?}, got {}",
                valid_environments,
                self.server.environment
            ));
        }

        if !self.result.path.starts_with('/') {
            return Err(anyhow!(
                "RESULT_PATH must start with '/', got {}",
                self.result.path
            ));
        }

        // Test mode against the live environment is almost always a mistake
        if self.server.environment == "production" && self.platron.test_mode {
            tracing::warn!("PLATRON_TEST_MODE is enabled in production");
        }

        self.platron.validate()?;

        Ok(())
    }
}
