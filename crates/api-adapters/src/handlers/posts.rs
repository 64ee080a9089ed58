use axum::extract::{Path, Query, State};
use domains::{Post, PostView, PostVote};

use super::{ApiResult, INVALID_POST_ID, INVALID_TOPIC_ID};
use crate::envelope::ApiResponse;
use crate::extract::{ValidJson, Viewer};
use crate::requests::{parse_id, CreatePostRequest, SearchQuery, UpdatePostRequest};
use crate::state::AppState;

pub(crate) async fn find_posts_by_topic(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Vec<PostView>>> {
    let topic_id = parse_id(&id, INVALID_TOPIC_ID)?;
    let posts = state.posts.find_posts_by_topic(&caller, topic_id).await?;
    Ok(ApiResponse::data(posts, "Successfully listed all posts"))
}

pub(crate) async fn find_post(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path((topic, post)): Path<(String, String)>,
) -> ApiResult<ApiResponse<PostView>> {
    let topic_id = parse_id(&topic, INVALID_TOPIC_ID)?;
    let post_id = parse_id(&post, INVALID_POST_ID)?;
    let post = state
        .posts
        .find_post_by_id(&caller, topic_id, post_id)
        .await?;
    Ok(ApiResponse::data(post, "Successfully find post"))
}

pub(crate) async fn search_posts(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<ApiResponse<Vec<PostView>>> {
    let topic_id = parse_id(&id, INVALID_TOPIC_ID)?;
    let posts = state
        .posts
        .search_posts(&caller, topic_id, query.term()?)
        .await?;
    Ok(ApiResponse::data(posts, "Successfully searched post"))
}

pub(crate) async fn create_post(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    ValidJson(req): ValidJson<CreatePostRequest>,
) -> ApiResult<ApiResponse<Post>> {
    let post = state
        .posts
        .create_post(&caller, req.topic_id, &req.title, &req.description)
        .await?;
    Ok(ApiResponse::data(post, "Successfully created post"))
}

pub(crate) async fn update_post(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdatePostRequest>,
) -> ApiResult<ApiResponse<Post>> {
    let post_id = parse_id(&id, INVALID_POST_ID)?;
    let post = state
        .posts
        .update_post(&caller, post_id, &req.title, &req.description)
        .await?;
    Ok(ApiResponse::data(post, "Successfully updated post"))
}

pub(crate) async fn delete_post(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    let post_id = parse_id(&id, INVALID_POST_ID)?;
    state.posts.delete_post(&caller, post_id).await?;
    Ok(ApiResponse::message("Successfully deleted post"))
}

pub(crate) async fn like_post(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<PostVote>> {
    let post_id = parse_id(&id, INVALID_POST_ID)?;
    let vote = state.posts.like_post(&caller, post_id).await?;
    Ok(ApiResponse::data(vote, "Successfully liked post"))
}

pub(crate) async fn dislike_post(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<PostVote>> {
    let post_id = parse_id(&id, INVALID_POST_ID)?;
    let vote = state.posts.dislike_post(&caller, post_id).await?;
    Ok(ApiResponse::data(vote, "Successfully disliked post"))
}

pub(crate) async fn remove_post_vote(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    let post_id = parse_id(&id, INVALID_POST_ID)?;
    state.posts.remove_post_vote(&caller, post_id).await?;
    Ok(ApiResponse::message("Successfully removed vote"))
}
