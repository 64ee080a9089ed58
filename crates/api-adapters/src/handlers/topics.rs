use axum::extract::{Path, Query, State};
use domains::Topic;

use super::{ApiResult, INVALID_TOPIC_ID};
use crate::envelope::ApiResponse;
use crate::extract::{ValidJson, Viewer};
use crate::requests::{parse_id, SearchQuery, TopicRequest};
use crate::state::AppState;

pub(crate) async fn list_topics(
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<Topic>>> {
    let topics = state.topics.list_topics().await?;
    Ok(ApiResponse::data(topics, "Successfully listed all topics"))
}

pub(crate) async fn find_topic(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Topic>> {
    let topic_id = parse_id(&id, INVALID_TOPIC_ID)?;
    let topic = state.topics.find_topic_by_id(topic_id).await?;
    Ok(ApiResponse::data(topic, "Successfully find topic"))
}

pub(crate) async fn create_topic(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    ValidJson(req): ValidJson<TopicRequest>,
) -> ApiResult<ApiResponse<Topic>> {
    let topic = state.topics.create_topic(&caller, &req.title).await?;
    Ok(ApiResponse::data(topic, "Successfully created topic"))
}

pub(crate) async fn update_topic(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<TopicRequest>,
) -> ApiResult<ApiResponse<Topic>> {
    let topic_id = parse_id(&id, INVALID_TOPIC_ID)?;
    let topic = state
        .topics
        .update_topic(&caller, topic_id, &req.title)
        .await?;
    Ok(ApiResponse::data(topic, "Successfully updated topic"))
}

pub(crate) async fn delete_topic(
    State(state): State<AppState>,
    Viewer(caller): Viewer,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    let topic_id = parse_id(&id, INVALID_TOPIC_ID)?;
    state.topics.delete_topic(&caller, topic_id).await?;
    Ok(ApiResponse::message("Successfully deleted topic"))
}

pub(crate) async fn search_topics(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<ApiResponse<Vec<Topic>>> {
    let topics = state.topics.search_topics(query.term()?).await?;
    Ok(ApiResponse::data(topics, "Successfully searched topic"))
}
