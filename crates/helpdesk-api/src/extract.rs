//! Extractors whose rejections use the JSON error body.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// [`axum::extract::Query`], rejecting with [`ApiError::BadRequest`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<T, S> FromRequestParts<S> for Query<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let axum::extract::Query(value) = axum::extract::Query::<T>::from_request_parts(parts, state)
      .await
      .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    Ok(Query(value))
  }
}
