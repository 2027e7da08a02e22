//! Handlers for `/tickets` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tickets` | Filters: `status`, `priority`, `created_by`, `assigned_to`, `issue_type_id`, `unresolved_only` |
//! | `POST`   | `/tickets` | Body: `{"title":"…","issue_type_id":"…"}`; needs an identified caller |
//! | `GET`    | `/tickets/page` | Filters plus `page_number` (default 1) and `page_size` (default 20) |
//! | `GET`    | `/tickets/near-sla` | `?threshold_hours=N` |
//! | `GET`    | `/tickets/stats` | |
//! | `GET`    | `/tickets/:id` | `ETag` carries the version |
//! | `PATCH`  | `/tickets/:id` | Honours `If-Match` |
//! | `DELETE` | `/tickets/:id` | 204, or 404 |
//! | `POST`   | `/tickets/:id/assign` | Body: `{"analyst_id":"…"}`; honours `If-Match` |
//! | `POST`   | `/tickets/:id/status` | Body: `{"status":"Resolved"}`; honours `If-Match` |
//! | `POST`   | `/tickets/:id/escalate` | Body: `{"reason":"…"}`; honours `If-Match` |
//! | `GET`    | `/tickets/:id/history` | Oldest first |

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use helpdesk_core::{
  query::{PageRequest, TicketFilter, TicketPage},
  stats::TicketStatistics,
  store::HelpdeskStore,
  ticket::{
    Escalation, NewTicket, Ticket, TicketHistory, TicketPatch, TicketPriority, TicketStatus,
  },
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, Caller, error::ApiError, extract::Query};

const DEFAULT_PAGE_SIZE: u32 = 20;

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("ticket {id} not found")) }

/// A ticket with its version as a strong `ETag`.
fn with_etag(status: StatusCode, ticket: Ticket) -> Response {
  let mut response = (status, Json(&ticket)).into_response();
  if let Ok(etag) = HeaderValue::from_str(&format!("\"{}\"", ticket.version)) {
    response.headers_mut().insert(header::ETAG, etag);
  }
  response
}

/// The version named by `If-Match`, if any. `*` matches every version.
pub(crate) fn if_match(headers: &HeaderMap) -> Result<Option<i64>, ApiError> {
  let Some(value) = headers.get(header::IF_MATCH) else {
    return Ok(None);
  };
  let bad = || ApiError::BadRequest("If-Match must be a ticket version".into());
  let raw = value.to_str().map_err(|_| bad())?.trim();
  if raw == "*" {
    return Ok(None);
  }
  let raw = raw.strip_prefix("W/").unwrap_or(raw).trim_matches('"');
  raw.parse().map(Some).map_err(|_| bad())
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
  pub status:          Option<TicketStatus>,
  pub priority:        Option<TicketPriority>,
  pub created_by:      Option<Uuid>,
  pub assigned_to:     Option<Uuid>,
  pub issue_type_id:   Option<Uuid>,
  #[serde(default)]
  pub unresolved_only: bool,
}

impl From<FilterParams> for TicketFilter {
  fn from(p: FilterParams) -> Self {
    TicketFilter {
      status:          p.status,
      priority:        p.priority,
      created_by:      p.created_by,
      assigned_to:     p.assigned_to,
      issue_type_id:   p.issue_type_id,
      created_before:  None,
      unresolved_only: p.unresolved_only,
    }
  }
}

/// `GET /tickets[?status=…&priority=…]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<FilterParams>,
) -> Result<Json<Vec<Ticket>>, ApiError>
where
  S: HelpdeskStore,
{
  let tickets = state.desk.list_tickets(&params.into()).await?;
  Ok(Json(tickets))
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
  pub page_number: Option<u32>,
  pub page_size:   Option<u32>,
}

/// `GET /tickets/page?page_number=2&page_size=10[&filters]`
pub async fn page<S>(
  State(state): State<ApiState<S>>,
  Query(filter): Query<FilterParams>,
  Query(paging): Query<PageParams>,
) -> Result<Json<TicketPage>, ApiError>
where
  S: HelpdeskStore,
{
  let page = PageRequest::new(
    paging.page_number.unwrap_or(1),
    paging.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
  )?;
  let page = state.desk.page_tickets(&filter.into(), page).await?;
  Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct NearSlaParams {
  pub threshold_hours: i64,
}

/// `GET /tickets/near-sla?threshold_hours=N`
pub async fn near_sla<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<NearSlaParams>,
) -> Result<Json<Vec<Ticket>>, ApiError>
where
  S: HelpdeskStore,
{
  Ok(Json(state.desk.near_sla(params.threshold_hours).await?))
}

/// `GET /tickets/stats`
pub async fn stats<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<TicketStatistics>, ApiError>
where
  S: HelpdeskStore,
{
  Ok(Json(state.desk.statistics().await?))
}

// ─── Single ticket ────────────────────────────────────────────────────────────

/// `POST /tickets`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Caller(actor): Caller,
  Json(body): Json<NewTicket>,
) -> Result<Response, ApiError>
where
  S: HelpdeskStore,
{
  let ticket = state.desk.create_ticket(body, &actor).await?;
  Ok(with_etag(StatusCode::CREATED, ticket))
}

/// `GET /tickets/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  S: HelpdeskStore,
{
  let ticket = state.desk.get_ticket(id).await?.ok_or_else(|| not_found(id))?;
  Ok(with_etag(StatusCode::OK, ticket))
}

/// `PATCH /tickets/:id`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  Caller(actor): Caller,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  Json(patch): Json<TicketPatch>,
) -> Result<Response, ApiError>
where
  S: HelpdeskStore,
{
  let ticket = state
    .desk
    .update_ticket(id, patch, &actor, if_match(&headers)?)
    .await?
    .ok_or_else(|| not_found(id))?;
  Ok(with_etag(StatusCode::OK, ticket))
}

/// `DELETE /tickets/:id`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: HelpdeskStore,
{
  if state.desk.delete_ticket(id).await? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(not_found(id))
  }
}

// ─── Transitions ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub analyst_id: Uuid,
}

/// `POST /tickets/:id/assign`
pub async fn assign<S>(
  State(state): State<ApiState<S>>,
  Caller(actor): Caller,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<AssignBody>,
) -> Result<Response, ApiError>
where
  S: HelpdeskStore,
{
  let ticket = state
    .desk
    .assign(id, body.analyst_id, &actor, if_match(&headers)?)
    .await?
    .ok_or_else(|| not_found(id))?;
  Ok(with_etag(StatusCode::OK, ticket))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: TicketStatus,
}

/// `POST /tickets/:id/status`
pub async fn set_status<S>(
  State(state): State<ApiState<S>>,
  Caller(actor): Caller,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<StatusBody>,
) -> Result<Response, ApiError>
where
  S: HelpdeskStore,
{
  let ticket = state
    .desk
    .update_status(id, body.status, &actor, if_match(&headers)?)
    .await?
    .ok_or_else(|| not_found(id))?;
  Ok(with_etag(StatusCode::OK, ticket))
}

/// `POST /tickets/:id/escalate`
pub async fn escalate<S>(
  State(state): State<ApiState<S>>,
  Caller(actor): Caller,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<Escalation>,
) -> Result<Response, ApiError>
where
  S: HelpdeskStore,
{
  let ticket = state
    .desk
    .escalate(id, body, &actor, if_match(&headers)?)
    .await?
    .ok_or_else(|| not_found(id))?;
  Ok(with_etag(StatusCode::OK, ticket))
}

/// `GET /tickets/:id/history`
pub async fn history<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<TicketHistory>>, ApiError>
where
  S: HelpdeskStore,
{
  let rows = state.desk.history(id).await?.ok_or_else(|| not_found(id))?;
  Ok(Json(rows))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn headers(value: &'static str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(header::IF_MATCH, HeaderValue::from_static(value));
    map
  }

  #[test]
  fn if_match_accepts_quoted_weak_and_bare_versions() {
    assert_eq!(if_match(&HeaderMap::new()).unwrap(), None);
    assert_eq!(if_match(&headers("\"4\"")).unwrap(), Some(4));
    assert_eq!(if_match(&headers("W/\"4\"")).unwrap(), Some(4));
    assert_eq!(if_match(&headers("4")).unwrap(), Some(4));
    assert_eq!(if_match(&headers("*")).unwrap(), None);
    assert!(matches!(if_match(&headers("\"abc\"")), Err(ApiError::BadRequest(_))));
  }
}
