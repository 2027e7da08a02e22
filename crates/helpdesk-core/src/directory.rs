//! Reference entities: users, departments, and issue types.
//!
//! Tickets point at these but never own them. Names are unique
//! (case-insensitive) within each kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::ticket::SupportLevel;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
pub enum UserRole {
  #[default]
  EndUser,
  Analyst,
  Admin,
}

impl UserRole {
  /// Analysts and admins can be assigned tickets and see internal notes.
  pub fn is_staff(self) -> bool { matches!(self, Self::Analyst | Self::Admin) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub name:          String,
  pub email:         String,
  pub role:          UserRole,
  pub department_id: Option<Uuid>,
  /// The tier an analyst works at; unused for end users.
  pub support_level: Option<SupportLevel>,
  pub is_active:     bool,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  #[serde(default)]
  pub role:          UserRole,
  pub department_id: Option<Uuid>,
  pub support_level: Option<SupportLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
  pub department_id: Uuid,
  pub name:          String,
  pub description:   Option<String>,
  pub is_active:     bool,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueType {
  pub issue_type_id: Uuid,
  pub name:          String,
  pub description:   Option<String>,
  pub is_active:     bool,
  pub created_at:    DateTime<Utc>,
}

/// Body shared by department and issue-type creation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLookup {
  pub name:        String,
  pub description: Option<String>,
}

/// Outcome of deleting a reference entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
  Removed,
  NotFound,
  /// Still referenced by a ticket (or, for departments, by a user).
  InUse,
}
