use axum::extract::State;
use domains::User;
use serde::Serialize;

use super::ApiResult;
use crate::envelope::ApiResponse;
use crate::error::ApiError;
use crate::extract::{ValidJson, Viewer};
use crate::requests::LoginRequest;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    token: String,
}

pub(crate) async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<ApiResponse<LoginResponse>> {
    let outcome = state
        .auth
        .login(&req.username)
        .await
        .map_err(ApiError::from_login)?;
    Ok(ApiResponse::data(
        LoginResponse {
            token: outcome.token,
        },
        "Successfully login",
    ))
}

pub(crate) async fn me(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
) -> ApiResult<ApiResponse<User>> {
    let user = state.auth.authenticate_user(&caller).await?;
    Ok(ApiResponse::data(user, "Successfully authenticate user"))
}
