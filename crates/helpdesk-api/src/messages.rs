//! Handlers for a ticket's conversation thread.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tickets/:id/messages` | Internal notes only for staff callers |
//! | `POST` | `/tickets/:id/messages` | Body: `{"body":"…","is_internal":false,"is_ai":false}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use helpdesk_core::{
  store::HelpdeskStore,
  ticket::{NewMessage, TicketMessage},
};
use uuid::Uuid;

use crate::{ApiState, Caller, error::ApiError};

/// `GET /tickets/:id/messages`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Caller(actor): Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<TicketMessage>>, ApiError>
where
  S: HelpdeskStore,
{
  let messages = state
    .desk
    .messages(id, &actor)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("ticket {id} not found")))?;
  Ok(Json(messages))
}

/// `POST /tickets/:id/messages`
pub async fn post_one<S>(
  State(state): State<ApiState<S>>,
  Caller(actor): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<NewMessage>,
) -> Result<impl IntoResponse, ApiError>
where
  S: HelpdeskStore,
{
  let message = state
    .desk
    .post_message(id, body, &actor)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("ticket {id} not found")))?;
  Ok((StatusCode::CREATED, Json(message)))
}
