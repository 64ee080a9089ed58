use axum::extract::{Path, State};
use domains::{Comment, CommentView, CommentVote};

use super::{ApiResult, INVALID_COMMENT_ID, INVALID_POST_ID, INVALID_TOPIC_ID};
use crate::envelope::ApiResponse;
use crate::extract::{ValidJson, Viewer};
use crate::requests::{parse_id, CreateCommentRequest, UpdateCommentRequest};
use crate::state::AppState;

pub(crate) async fn find_comments_by_post(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path((topic, post)): Path<(String, String)>,
) -> ApiResult<ApiResponse<Vec<CommentView>>> {
    let topic_id = parse_id(&topic, INVALID_TOPIC_ID)?;
    let post_id = parse_id(&post, INVALID_POST_ID)?;
    let comments = state
        .comments
        .find_comments_by_post(&caller, topic_id, post_id)
        .await?;
    Ok(ApiResponse::data(comments, "Successfully listed all comments"))
}

pub(crate) async fn create_comment(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    ValidJson(req): ValidJson<CreateCommentRequest>,
) -> ApiResult<ApiResponse<Comment>> {
    let comment = state
        .comments
        .create_comment(&caller, req.post_id, &req.description)
        .await?;
    Ok(ApiResponse::data(comment, "Successfully created comment"))
}

pub(crate) async fn update_comment(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateCommentRequest>,
) -> ApiResult<ApiResponse<Comment>> {
    let comment_id = parse_id(&id, INVALID_COMMENT_ID)?;
    let comment = state
        .comments
        .update_comment(&caller, comment_id, &req.description)
        .await?;
    Ok(ApiResponse::data(comment, "Successfully updated comment"))
}

pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    let comment_id = parse_id(&id, INVALID_COMMENT_ID)?;
    state.comments.delete_comment(&caller, comment_id).await?;
    Ok(ApiResponse::message("Successfully deleted comment"))
}

pub(crate) async fn like_comment(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<CommentVote>> {
    let comment_id = parse_id(&id, INVALID_COMMENT_ID)?;
    let vote = state.comments.like_comment(&caller, comment_id).await?;
    Ok(ApiResponse::data(vote, "Successfully liked comment"))
}

pub(crate) async fn dislike_comment(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<CommentVote>> {
    let comment_id = parse_id(&id, INVALID_COMMENT_ID)?;
    let vote = state.comments.dislike_comment(&caller, comment_id).await?;
    Ok(ApiResponse::data(vote, "Successfully disliked comment"))
}

pub(crate) async fn remove_comment_vote(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    let comment_id = parse_id(&id, INVALID_COMMENT_ID)?;
    state
        .comments
        .remove_comment_vote(&caller, comment_id)
        .await?;
    Ok(ApiResponse::message("Successfully removed vote"))
}
