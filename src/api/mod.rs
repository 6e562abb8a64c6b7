//! HTTP surface: health probe and the Platron result endpoint.

pub mod health;
pub mod result;

use crate::config::Config;
use crate::payments::CallbackValidator;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub validator: Arc<CallbackValidator>,
}

impl AppState {
    pub fn new(config: Config, validator: CallbackValidator) -> Self {
        Self {
            config,
            validator: Arc::new(validator),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let result_path = state.config.result.path.clone();

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            &result_path,
            get(result::handle_result).post(result::handle_result),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
