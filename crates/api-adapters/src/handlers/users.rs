use axum::extract::{Path, State};
use domains::User;

use super::ApiResult;
use crate::envelope::ApiResponse;
use crate::extract::ValidJson;
use crate::requests::CreateUserRequest;
use crate::state::AppState;

pub(crate) async fn create_user(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateUserRequest>,
) -> ApiResult<ApiResponse<User>> {
    let user = state.users.create_user(&req.name).await?;
    Ok(ApiResponse::data(user, "Successfully created user"))
}

pub(crate) async fn find_user_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<ApiResponse<User>> {
    let user = state.users.find_user_by_name(&name).await?;
    Ok(ApiResponse::data(user, "Successfully find user"))
}
