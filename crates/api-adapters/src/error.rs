use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domains::{DomainError, Resource};
use tracing::{error, warn};

use crate::envelope::ApiResponse;

pub const REQUIRED_FIELDS_MISSING: &str = "Required fields missing";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// A failed request: the status to answer with and the message for the envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Login treats an unknown user as bad credentials rather than a missing row.
    pub fn from_login(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(Resource::User) => Self::unauthorized(INVALID_CREDENTIALS),
            other => other.into(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            DomainError::AlreadyExists(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            DomainError::InvalidRequest(message) => Self::bad_request(message),
            DomainError::DependencyFailure(step) => {
                warn!(%step, "transaction rolled back");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, step.to_string())
            }
            DomainError::Unexpected(source) => {
                error!(error = %source, "unexpected failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::error(self.status.as_u16(), self.message);
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::FailedStep;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::NotFound(Resource::Post), StatusCode::NOT_FOUND, "post not found"),
            (
                DomainError::AlreadyExists(Resource::Topic),
                StatusCode::CONFLICT,
                "topic already exists",
            ),
            (
                DomainError::DependencyFailure(FailedStep::PostStatusTouch),
                StatusCode::INTERNAL_SERVER_ERROR,
                "post not updated",
            ),
            (
                DomainError::unexpected("pool timed out"),
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR,
            ),
        ];
        for (err, status, message) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, status);
            assert_eq!(api.message, message);
        }
    }

    #[test]
    fn unknown_login_name_is_unauthorized() {
        let api = ApiError::from_login(DomainError::NotFound(Resource::User));
        assert_eq!(api.status, StatusCode::UNAUTHORIZED);
        assert_eq!(api.message, INVALID_CREDENTIALS);
    }
}
