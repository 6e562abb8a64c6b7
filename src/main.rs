use platron_merchant::api::{self, AppState};
use platron_merchant::config::Config;
use platron_merchant::payments::handler::LoggingPaymentHandler;
use platron_merchant::payments::PlatronClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting Platron merchant service");
    tracing::info!("Environment: {}", config.server.environment);
    tracing::info!("Merchant: {}", config.platron.account_id);
    tracing::info!("Result endpoint: {}", config.result.path);

    let client = PlatronClient::new(config.platron.clone())?;
    let validator = client.callback_validator(Arc::new(LoggingPaymentHandler));

    let app = api::router(AppState::new(config.clone(), validator));

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
