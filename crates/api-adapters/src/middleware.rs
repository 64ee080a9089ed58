//! Request middleware: bearer-token authentication and request metrics.

use axum::extract::{MatchedPath, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use domains::{AuthenticatedUser, TokenError};
use tracing::Span;

use crate::error::ApiError;
use crate::state::AppState;

pub const INVALID_AUTH_HEADER: &str = "Invalid Authorization Header";
pub const INVALID_TOKEN: &str = "Invalid token";

/// Pulls the token out of `Authorization: Bearer <token>`. The scheme is
/// case-insensitive.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Verifies the bearer token and attaches the caller to the request.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized(INVALID_AUTH_HEADER))?;
    let token = bearer_token(header).ok_or_else(|| ApiError::unauthorized(INVALID_AUTH_HEADER))?;

    let user_id = state.verifier.verify(token).map_err(|err| match err {
        TokenError::Expired => ApiError::unauthorized("Token expired"),
        _ => ApiError::unauthorized(INVALID_TOKEN),
    })?;

    Span::current().record("user_id", user_id);
    req.extensions_mut().insert(AuthenticatedUser::new(user_id));
    Ok(next.run(req).await)
}

/// Counts every response by method, route pattern and status.
pub async fn record_metrics(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    state
        .metrics
        .record_request(&method, &path, response.status().as_u16());
    response
}
