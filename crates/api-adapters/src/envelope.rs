use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Payload<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// The body of every response, successful or not.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub payload: Payload<T>,
    pub messages: Vec<String>,
    /// HTTP status on failure, `0` on success.
    #[serde(rename = "errorCode")]
    pub error_code: u16,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T, message: &str) -> Self {
        Self {
            payload: Payload { data: Some(data) },
            messages: vec![message.to_string()],
            error_code: 0,
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: &str) -> Self {
        Self {
            payload: Payload { data: None },
            messages: vec![message.to_string()],
            error_code: 0,
        }
    }

    pub fn error(status: u16, message: String) -> Self {
        Self {
            payload: Payload { data: None },
            messages: vec![message],
            error_code: status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
