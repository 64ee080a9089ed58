//! # Errors
//!
//! Two layers: `RepoError` is what a store adapter reports, `DomainError` is
//! what a service hands back to the transport layer. Services translate the
//! former into the latter per operation, so a raw store error never leaks.

use std::fmt;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The kinds of rows a `NotFound` / `AlreadyExists` can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    User,
    Topic,
    Post,
    Comment,
    Vote,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::User => "user",
            Resource::Topic => "topic",
            Resource::Post => "post",
            Resource::Comment => "comment",
            Resource::Vote => "vote",
        };
        f.write_str(name)
    }
}

/// A secondary step of a multi-statement transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStep {
    /// Touching the parent post's `updated_at` after a comment write.
    PostStatusTouch,
}

impl fmt::Display for FailedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailedStep::PostStatusTouch => f.write_str("post not updated"),
        }
    }
}

/// The primary error type for all service operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// The row does not exist, or (for owner-scoped writes) is not the caller's.
    #[error("{0} not found")]
    NotFound(Resource),

    /// A uniqueness constraint would be violated.
    #[error("{0} already exists")]
    AlreadyExists(Resource),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A later step of a transaction failed; the whole transaction was rolled back.
    #[error("{0}")]
    DependencyFailure(FailedStep),

    #[error("unexpected error: {0}")]
    Unexpected(#[source] BoxError),
}

impl DomainError {
    pub fn unexpected<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        DomainError::Unexpected(err.into())
    }
}

/// A specialized Result type for service logic.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Failures reported by a store adapter.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("unique constraint violated{}", constraint_suffix(.constraint))]
    UniqueViolation { constraint: Option<String> },

    #[error("foreign key constraint violated{}", constraint_suffix(.constraint))]
    ForeignKeyViolation { constraint: Option<String> },

    #[error("check constraint violated{}", constraint_suffix(.constraint))]
    CheckViolation { constraint: Option<String> },

    /// A row came back in a shape the domain cannot represent.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("storage backend error: {0}")]
    Backend(#[source] BoxError),
}

fn constraint_suffix(constraint: &Option<String>) -> String {
    match constraint {
        Some(name) => format!(" ({name})"),
        None => String::new(),
    }
}

pub type RepoResult<T> = std::result::Result<T, RepoError>;

impl RepoError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        RepoError::Backend(err.into())
    }
}

/// The fallback translation. Unique and foreign key violations only mean
/// something in the context of a particular write, so services match on
/// those before falling back to this.
impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::CheckViolation { constraint } => DomainError::InvalidRequest(format!(
                "value rejected by store{}",
                constraint_suffix(&constraint)
            )),
            other => DomainError::Unexpected(Box::new(other)),
        }
    }
}
