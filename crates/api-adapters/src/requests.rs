//! Request bodies and query strings. Unknown fields are rejected; required
//! strings must not be blank.

use serde::Deserialize;

use crate::error::{ApiError, REQUIRED_FIELDS_MISSING};

pub const QUERY_STRING_MISSING: &str = "Query string missing";

/// Checks a decoded body before it reaches a service.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

fn require(fields: &[&str]) -> Result<(), ApiError> {
    if fields.iter().any(|field| field.trim().is_empty()) {
        return Err(ApiError::bad_request(REQUIRED_FIELDS_MISSING));
    }
    Ok(())
}

fn require_id(id: i64) -> Result<(), ApiError> {
    if id < 1 {
        return Err(ApiError::bad_request(REQUIRED_FIELDS_MISSING));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.username])
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub name: String,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.name])
    }
}

/// Body of both create and update topic.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicRequest {
    pub title: String,
}

impl Validate for TopicRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.title])
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub topic_id: i64,
    pub title: String,
    pub description: String,
}

impl Validate for CreatePostRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_id(self.topic_id)?;
        require(&[&self.title, &self.description])
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub title: String,
    pub description: String,
}

impl Validate for UpdatePostRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.title, &self.description])
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: i64,
    pub description: String,
}

impl Validate for CreateCommentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require_id(self.post_id)?;
        require(&[&self.description])
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub description: String,
}

impl Validate for UpdateCommentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.description])
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

impl SearchQuery {
    /// The search term, or 400 when it is absent or blank.
    pub fn term(&self) -> Result<&str, ApiError> {
        match self.q.as_deref() {
            Some(q) if !q.trim().is_empty() => Ok(q),
            _ => Err(ApiError::bad_request(QUERY_STRING_MISSING)),
        }
    }
}

/// Parses a path segment as a row id, answering 400 with `message` otherwise.
pub fn parse_id(raw: &str, message: &'static str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::bad_request(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_rejected() {
        let req = CreatePostRequest {
            topic_id: 1,
            title: "  ".to_string(),
            description: "body".to_string(),
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.message, REQUIRED_FIELDS_MISSING);
    }

    #[test]
    fn non_positive_parent_id_is_rejected() {
        let req = CreateCommentRequest {
            post_id: 0,
            description: "hi".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn unknown_fields_fail_to_decode() {
        let result: Result<TopicRequest, _> =
            serde_json::from_str(r#"{"title":"Rust","extra":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn camel_case_ids_decode() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"topicId":3,"title":"t","description":"d"}"#).unwrap();
        assert_eq!(req.topic_id, 3);
    }

    #[test]
    fn empty_query_is_rejected() {
        let query = SearchQuery {
            q: Some(" ".to_string()),
        };
        assert_eq!(query.term().unwrap_err().message, QUERY_STRING_MISSING);
        assert!(SearchQuery { q: None }.term().is_err());
    }

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id("42", "Invalid post id").unwrap(), 42);
        assert_eq!(
            parse_id("abc", "Invalid post id").unwrap_err().message,
            "Invalid post id"
        );
    }
}
