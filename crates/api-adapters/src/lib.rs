//! # api-adapters
//!
//! The HTTP surface. Handlers decode and validate the request, call one
//! service method, and wrap the result in the JSON envelope:
//!
//! ```json
//! { "payload": { "data": ... }, "messages": ["..."], "errorCode": 0 }
//! ```

#[cfg(feature = "web-axum")]
pub mod envelope;
#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
mod handlers;
pub mod metrics;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
pub mod requests;
#[cfg(feature = "web-axum")]
pub mod routes;
#[cfg(feature = "web-axum")]
pub mod state;

#[cfg(feature = "web-axum")]
pub use envelope::ApiResponse;
#[cfg(feature = "web-axum")]
pub use error::ApiError;
pub use metrics::Metrics;
#[cfg(feature = "web-axum")]
pub use routes::router;
#[cfg(feature = "web-axum")]
pub use state::AppState;
