//! Caller identity from request headers.
//!
//! | Header | Value |
//! |--------|-------|
//! | `x-user-id` | user UUID |
//! | `x-user-role` | `EndUser`, `Analyst`, `Admin`, or `system` |
//!
//! No headers means an anonymous caller. Nothing here authenticates: the
//! id is trusted as sent.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use helpdesk_core::{directory::UserRole, identity::Actor};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The [`Actor`] a request runs as.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Actor);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
  headers
    .get(name)
    .map(|v| {
      v.to_str()
        .map(str::trim)
        .map_err(|_| ApiError::BadRequest(format!("{name} is not valid text")))
    })
    .transpose()
}

/// Resolve the acting identity from `headers`.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
  let id = header(headers, USER_ID_HEADER)?;
  let role = header(headers, USER_ROLE_HEADER)?;

  if role.is_some_and(|r| r.eq_ignore_ascii_case("system")) {
    return Ok(Actor::System);
  }

  let Some(id) = id else {
    return match role {
      None => Ok(Actor::Anonymous),
      Some(_) => Err(ApiError::BadRequest(format!(
        "{USER_ROLE_HEADER} given without {USER_ID_HEADER}"
      ))),
    };
  };

  let user_id = Uuid::parse_str(id)
    .map_err(|_| ApiError::BadRequest(format!("{USER_ID_HEADER} is not a UUID: {id:?}")))?;
  let role = match role {
    None => UserRole::default(),
    Some(r) => r
      .parse::<UserRole>()
      .map_err(|_| ApiError::BadRequest(format!("unknown {USER_ROLE_HEADER}: {r:?}")))?,
  };
  Ok(Actor::user(user_id, role))
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    actor_from_headers(&parts.headers).map(Caller)
  }
}
