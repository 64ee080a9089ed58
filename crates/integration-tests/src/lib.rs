//! Shared harness for the end-to-end API tests: the full router over an
//! in-memory store and real JWTs, driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use api_adapters::{router, AppState, Metrics};
use auth_adapters::JwtTokens;
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use services::{AuthService, CommentService, PostService, TopicService, UserService};
use storage_adapters::memory::MemoryStore;
use tower::ServiceExt;

const SECRET: &[u8] = b"integration-secret";

/// A decoded response: status plus the JSON envelope.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    /// `payload.data` of the envelope.
    pub fn data(&self) -> &Value {
        &self.body["payload"]["data"]
    }

    /// The first entry of `messages`.
    pub fn message(&self) -> &str {
        self.body["messages"][0].as_str().unwrap_or_default()
    }

    /// `payload.data.<field>` as an id.
    pub fn id(&self, field: &str) -> i64 {
        self.data()[field]
            .as_i64()
            .unwrap_or_else(|| panic!("no {field} in {}", self.body))
    }
}

pub struct TestApp {
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(JwtTokens::new(SECRET, chrono::Duration::hours(1)));
        let state = AppState {
            users: UserService::new(store.clone()),
            topics: TopicService::new(store.clone()),
            posts: PostService::new(store.clone(), store.clone()),
            comments: CommentService::new(store.clone(), store.clone()),
            auth: AuthService::new(store.clone(), tokens.clone()),
            verifier: tokens,
            metrics: Arc::new(Metrics::new()),
            frontend_url: "http://localhost:3000".to_string(),
        };
        Self {
            router: router(state, HeaderValue::from_static("http://localhost:3000")),
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply { status, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> Reply {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.request("POST", uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.request("PUT", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Reply {
        self.request("DELETE", uri, Some(token), None).await
    }

    /// Creates the user and returns a bearer token for them.
    pub async fn login_as(&self, name: &str) -> String {
        let created = self
            .request("POST", "/users", None, Some(serde_json::json!({ "name": name })))
            .await;
        assert_eq!(created.status, StatusCode::OK, "{}", created.body);
        let login = self
            .request(
                "POST",
                "/auth/login",
                None,
                Some(serde_json::json!({ "username": name })),
            )
            .await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.body);
        login.data()["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    pub async fn create_topic(&self, token: &str, title: &str) -> i64 {
        let reply = self
            .post("/api/topics", token, serde_json::json!({ "title": title }))
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.id("topic_id")
    }

    pub async fn create_post(&self, token: &str, topic_id: i64, title: &str) -> i64 {
        let reply = self
            .post(
                "/api/posts",
                token,
                serde_json::json!({
                    "topicId": topic_id,
                    "title": title,
                    "description": format!("{title} body"),
                }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.id("post_id")
    }

    pub async fn create_comment(&self, token: &str, post_id: i64, text: &str) -> i64 {
        let reply = self
            .post(
                "/api/comments",
                token,
                serde_json::json!({ "postId": post_id, "description": text }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.id("comment_id")
    }
}
