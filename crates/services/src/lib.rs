//! # services
//!
//! One service per resource. Each is built once at startup from injected
//! repository ports and enforces the existence, ownership and uniqueness
//! rules of its resource on top of them.

pub mod auth;
pub mod comments;
pub mod posts;
pub mod topics;
pub mod users;

pub use auth::{AuthService, LoginOutcome};
pub use comments::CommentService;
pub use posts::PostService;
pub use topics::TopicService;
pub use users::UserService;

use domains::{DomainError, RepoError, Resource};

/// Translates a failed write. A unique violation means `conflict` already
/// exists. A foreign key violation means the `parent` row is gone, unless the
/// violated key is the author's `user_id`, in which case the caller's own user
/// row is gone.
pub(crate) fn write_error(
    err: RepoError,
    conflict: Option<Resource>,
    parent: Option<Resource>,
) -> DomainError {
    match (err, conflict, parent) {
        (RepoError::UniqueViolation { .. }, Some(resource), _) => {
            DomainError::AlreadyExists(resource)
        }
        (RepoError::ForeignKeyViolation { constraint }, _, _)
            if constraint.as_deref().is_some_and(is_user_key) =>
        {
            DomainError::NotFound(Resource::User)
        }
        (RepoError::ForeignKeyViolation { .. }, _, Some(parent)) => DomainError::NotFound(parent),
        (err, _, _) => err.into(),
    }
}

fn is_user_key(constraint: &str) -> bool {
    constraint.ends_with("_user_id_fkey")
}
