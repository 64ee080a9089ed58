use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Redirect, Response};

use super::ApiResult;
use crate::envelope::ApiResponse;
use crate::error::{ApiError, INTERNAL_ERROR};
use crate::state::AppState;

pub(crate) async fn root(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.frontend_url)
}

pub(crate) async fn health() -> ApiResponse<()> {
    ApiResponse::message("ok")
}

pub(crate) async fn metrics(State(state): State<AppState>) -> ApiResult<Response> {
    let body = state.metrics.render().map_err(|err| {
        tracing::error!(error = %err, "failed to encode metrics");
        ApiError::new(
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_ERROR,
        )
    })?;
    Ok((
        [(
            CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    )
        .into_response())
}
