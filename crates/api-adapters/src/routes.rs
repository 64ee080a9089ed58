//! Route table. Everything under `/api` requires a bearer token.

use std::time::Duration;

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, comments, posts, system, topics, users};
use crate::middleware::{record_metrics, require_bearer};
use crate::state::AppState;

/// Builds the full application router.
///
/// `cors_origin` is the single origin allowed to make credentialed calls,
/// normally the frontend URL.
pub fn router(state: AppState, cors_origin: HeaderValue) -> Router {
    let protected = Router::new()
        .route("/me", get(auth::me))
        .route("/topics", get(topics::list_topics).post(topics::create_topic))
        .route("/topics/search", get(topics::search_topics))
        .route(
            "/topics/{id}",
            get(topics::find_topic)
                .put(topics::update_topic)
                .delete(topics::delete_topic),
        )
        .route("/posts", post(posts::create_post))
        .route("/posts/all/{id}", get(posts::find_posts_by_topic))
        .route("/posts/{id}/search", get(posts::search_posts))
        .route("/posts/{id}/{post_id}", get(posts::find_post))
        .route(
            "/posts/{id}",
            put(posts::update_post).delete(posts::delete_post),
        )
        .route("/posts/{id}/likes", post(posts::like_post))
        .route("/posts/{id}/dislikes", post(posts::dislike_post))
        .route("/posts/{id}/remove", delete(posts::remove_post_vote))
        .route("/comments", post(comments::create_comment))
        .route(
            "/comments/all/{id}/{post_id}",
            get(comments::find_comments_by_post),
        )
        .route(
            "/comments/{id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/comments/{id}/likes", post(comments::like_comment))
        .route("/comments/{id}/dislikes", post(comments::dislike_comment))
        .route("/comments/{id}/remove", delete(comments::remove_comment_vote))
        .route_layer(from_fn_with_state(state.clone(), require_bearer));

    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300));

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .route("/auth/login", post(auth::login))
        .route("/users", post(users::create_user))
        .route("/users/{name}", get(users::find_user_by_name))
        .nest("/api", protected)
        .route_layer(from_fn_with_state(state.clone(), record_metrics))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            tracing::info_span!(
                "http_request",
                method = %req.method(),
                uri = %req.uri(),
                user_id = tracing::field::Empty,
            )
        }))
        .layer(CatchPanicLayer::new())
        .layer(cors)
        .with_state(state)
}
