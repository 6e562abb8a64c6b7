//! Result endpoint the gateway posts payment notifications to.
//!
//! Answers with the signed XML acknowledgment. Without silent mode a bad
//! signature is a 403 and a processing failure a 503, so the gateway retries
//! the latter. In silent mode both are logged and swallowed.

use crate::api::AppState;
use crate::error::PlatronError;
use crate::payments::ParameterSet;
use axum::{
    extract::{rejection::FormRejection, OriginalUri, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use http::{header, StatusCode};
use std::collections::HashMap;
use tracing::{error, warn};

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

pub async fn handle_result(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Response {
    // An unreadable body carries no signature and fails verification below
    let data = match form {
        Ok(Form(fields)) => ParameterSet::from(fields),
        Err(rejection) => {
            warn!(target: "platron", "Unreadable result callback: {}", rejection);
            ParameterSet::new()
        }
    };

    match state.validator.process(uri.path(), data).await {
        Ok(outcome) => match outcome.to_xml() {
            Ok(xml) => (StatusCode::OK, [(header::CONTENT_TYPE, XML_CONTENT_TYPE)], xml).into_response(),
            Err(e) => {
                error!(target: "platron", "Failed to render acknowledgment: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
        Err(e) => failure_response(&state, e),
    }
}

fn failure_response(state: &AppState, err: PlatronError) -> Response {
    if state.config.result.silent {
        warn!(
            target: "platron",
            "Result callback failed ({:?}): {}",
            err.callback_state(),
            err
        );
        return match &state.config.result.redirect_url {
            Some(url) => Redirect::to(url).into_response(),
            None => StatusCode::OK.into_response(),
        };
    }

    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, err.to_string()).into_response()
}
