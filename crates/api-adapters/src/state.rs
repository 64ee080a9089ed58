use std::sync::Arc;

use domains::TokenVerifier;
use services::{AuthService, CommentService, PostService, TopicService, UserService};

use crate::metrics::Metrics;

/// Shared by every handler. Services are built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub topics: TopicService,
    pub posts: PostService,
    pub comments: CommentService,
    pub auth: AuthService,
    pub verifier: Arc<dyn TokenVerifier>,
    pub metrics: Arc<Metrics>,
    /// Where `GET /` redirects to.
    pub frontend_url: String,
}
