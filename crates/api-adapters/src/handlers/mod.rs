//! One module per resource. Each handler decodes its inputs, calls a single
//! service method and wraps the result in [`ApiResponse`](crate::ApiResponse).

pub(crate) mod auth;
pub(crate) mod comments;
pub(crate) mod posts;
pub(crate) mod system;
pub(crate) mod topics;
pub(crate) mod users;

use crate::error::ApiError;

pub(crate) type ApiResult<T> = Result<T, ApiError>;

pub(crate) const INVALID_TOPIC_ID: &str = "Invalid topic id";
pub(crate) const INVALID_POST_ID: &str = "Invalid post id";
pub(crate) const INVALID_COMMENT_ID: &str = "Invalid comment id";
