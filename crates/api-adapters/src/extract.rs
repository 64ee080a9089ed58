//! Typed extractors for handlers.

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use domains::AuthenticatedUser;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::requests::Validate;

/// The caller, as attached by the bearer middleware.
///
/// Handlers take this instead of reading request extensions themselves, so a
/// route that forgot the middleware fails closed with 401.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .map(Viewer)
            .ok_or_else(|| ApiError::unauthorized("Missing userID"))
    }
}

/// A JSON body that decoded cleanly and passed [`Validate`].
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}
