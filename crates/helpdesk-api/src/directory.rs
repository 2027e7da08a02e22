//! Handlers for users, departments, and issue types.
//!
//! Each collection (`/users`, `/departments`, `/issue-types`) has the same
//! shape:
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/{collection}` | `?active_only=true` hides deactivated rows |
//! | `POST`   | `/{collection}` | 409 on a duplicate name |
//! | `GET`    | `/{collection}/:id` | 404 if not found |
//! | `DELETE` | `/{collection}/:id` | 409 while still referenced |
//! | `POST`   | `/{collection}/:id/active` | Body: `{"is_active":false}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use helpdesk_core::{
  directory::{Department, IssueType, NewLookup, NewUser, User},
  store::HelpdeskStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError, extract::Query};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub active_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
  pub is_active: bool,
}

fn found<T>(row: Option<T>, kind: &str, id: Uuid) -> Result<Json<T>, ApiError> {
  row.map(Json).ok_or_else(|| ApiError::NotFound(format!("{kind} {id} not found")))
}

fn done(changed: bool, kind: &str, id: Uuid) -> Result<StatusCode, ApiError> {
  if changed {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("{kind} {id} not found")))
  }
}

// ─── Users ────────────────────────────────────────────────────────────────────

/// `GET /users[?active_only=true]`
pub async fn list_users<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: HelpdeskStore,
{
  Ok(Json(state.desk.list_users(params.active_only).await?))
}

/// `POST /users`
pub async fn create_user<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError>
where
  S: HelpdeskStore,
{
  let user = state.desk.create_user(body).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/:id`
pub async fn get_user<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: HelpdeskStore,
{
  found(state.desk.get_user(id).await?, "user", id)
}

/// `POST /users/:id/active`
pub async fn set_user_active<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ActiveBody>,
) -> Result<StatusCode, ApiError>
where
  S: HelpdeskStore,
{
  done(state.desk.set_user_active(id, body.is_active).await?, "user", id)
}

/// `DELETE /users/:id`
pub async fn delete_user<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: HelpdeskStore,
{
  done(state.desk.delete_user(id).await?, "user", id)
}

// ─── Departments ──────────────────────────────────────────────────────────────

/// `GET /departments[?active_only=true]`
pub async fn list_departments<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Department>>, ApiError>
where
  S: HelpdeskStore,
{
  Ok(Json(state.desk.list_departments(params.active_only).await?))
}

/// `POST /departments`
pub async fn create_department<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewLookup>,
) -> Result<impl IntoResponse, ApiError>
where
  S: HelpdeskStore,
{
  let department = state.desk.create_department(body).await?;
  Ok((StatusCode::CREATED, Json(department)))
}

/// `GET /departments/:id`
pub async fn get_department<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Department>, ApiError>
where
  S: HelpdeskStore,
{
  found(state.desk.get_department(id).await?, "department", id)
}

/// `POST /departments/:id/active`
pub async fn set_department_active<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ActiveBody>,
) -> Result<StatusCode, ApiError>
where
  S: HelpdeskStore,
{
  done(state.desk.set_department_active(id, body.is_active).await?, "department", id)
}

/// `DELETE /departments/:id`
pub async fn delete_department<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: HelpdeskStore,
{
  done(state.desk.delete_department(id).await?, "department", id)
}

// ─── Issue types ──────────────────────────────────────────────────────────────

/// `GET /issue-types[?active_only=true]`
pub async fn list_issue_types<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<IssueType>>, ApiError>
where
  S: HelpdeskStore,
{
  Ok(Json(state.desk.list_issue_types(params.active_only).await?))
}

/// `POST /issue-types`
pub async fn create_issue_type<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewLookup>,
) -> Result<impl IntoResponse, ApiError>
where
  S: HelpdeskStore,
{
  let issue_type = state.desk.create_issue_type(body).await?;
  Ok((StatusCode::CREATED, Json(issue_type)))
}

/// `GET /issue-types/:id`
pub async fn get_issue_type<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<IssueType>, ApiError>
where
  S: HelpdeskStore,
{
  found(state.desk.get_issue_type(id).await?, "issue type", id)
}

/// `POST /issue-types/:id/active`
pub async fn set_issue_type_active<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ActiveBody>,
) -> Result<StatusCode, ApiError>
where
  S: HelpdeskStore,
{
  done(state.desk.set_issue_type_active(id, body.is_active).await?, "issue type", id)
}

/// `DELETE /issue-types/:id`
pub async fn delete_issue_type<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: HelpdeskStore,
{
  done(state.desk.delete_issue_type(id).await?, "issue type", id)
}
