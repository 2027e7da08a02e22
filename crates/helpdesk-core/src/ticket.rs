//! Ticket types: the record at the centre of the helpdesk.
//!
//! A ticket is mutable, but every mutation bumps its `version` and appends
//! one or more [`TicketHistory`] rows. History and messages are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

// ─── Enumerations ────────────────────────────────────────────────────────────
//
// The variant spelling is the storage and wire format (`InProgress`, not
// `in_progress`). Existing rows depend on it; do not add `rename_all`.

/// Where a ticket is in its lifecycle.
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
  EnumIter,
)]
pub enum TicketStatus {
  #[default]
  Open,
  InProgress,
  Pending,
  Resolved,
  Closed,
}

impl TicketStatus {
  /// `Resolved` and `Closed` stop the SLA clock and stamp `resolved_at`.
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Resolved | Self::Closed)
  }
}

/// Urgency of a ticket. Ordered from least to most urgent.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
pub enum TicketPriority {
  Low,
  #[default]
  Medium,
  High,
  Urgent,
}

/// Escalation tier; `N3` requires the most senior analysts.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
pub enum SupportLevel {
  #[default]
  N1,
  N2,
  N3,
}

impl SupportLevel {
  /// The tier above this one, or `None` at the top.
  pub fn next(self) -> Option<Self> {
    match self {
      Self::N1 => Some(Self::N2),
      Self::N2 => Some(Self::N3),
      Self::N3 => None,
    }
  }
}

// ─── Ticket ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
  pub ticket_id:     Uuid,
  pub title:         String,
  pub description:   String,
  pub status:        TicketStatus,
  pub priority:      TicketPriority,
  pub issue_type_id: Uuid,
  /// The user who opened the ticket.
  pub created_by:    Uuid,
  pub assigned_to:   Option<Uuid>,
  pub support_level: SupportLevel,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
  /// Set when the ticket last entered `Resolved` or `Closed`.
  pub resolved_at:   Option<DateTime<Utc>>,
  /// Optimistic-concurrency counter. Starts at 1; the store bumps it on
  /// every successful update.
  pub version:       i64,
}

impl Ticket {
  /// Hours elapsed between creation and resolution, if resolved.
  pub fn resolution_hours(&self) -> Option<f64> {
    self
      .resolved_at
      .map(|at| (at - self.created_at).num_seconds() as f64 / 3600.0)
  }
}

/// Input to [`crate::service::Helpdesk::create_ticket`]. Status, support
/// level, timestamps and the creator are set by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
  pub title:         String,
  #[serde(default)]
  pub description:   String,
  #[serde(default)]
  pub priority:      TicketPriority,
  pub issue_type_id: Uuid,
}

/// A partial edit of the free-form ticket fields. `None` leaves a field
/// untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketPatch {
  pub title:         Option<String>,
  pub description:   Option<String>,
  pub priority:      Option<TicketPriority>,
  pub issue_type_id: Option<Uuid>,
}

impl TicketPatch {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.description.is_none()
      && self.priority.is_none()
      && self.issue_type_id.is_none()
  }
}

/// Parameters for [`crate::service::Helpdesk::escalate`].
#[derive(Debug, Clone, Deserialize)]
pub struct Escalation {
  /// Defaults to the level above the ticket's current one.
  pub target_level: Option<SupportLevel>,
  pub reason:       String,
  /// Explicit assignee; when absent the least-loaded analyst at the target
  /// level is picked.
  pub assign_to:    Option<Uuid>,
}

// ─── History ─────────────────────────────────────────────────────────────────

/// The kind of change an audit row describes.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeType {
  Created,
  StatusChange,
  Assignment,
  Escalation,
  Update,
}

/// An append-only audit row. Never updated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketHistory {
  pub history_id:  Uuid,
  pub ticket_id:   Uuid,
  /// `None` for changes made by the system or an anonymous caller.
  pub changed_by:  Option<Uuid>,
  pub change_type: ChangeType,
  pub description: String,
  pub old_value:   Option<String>,
  pub new_value:   Option<String>,
  pub created_at:  DateTime<Utc>,
}

// ─── Messages ────────────────────────────────────────────────────────────────

/// One entry in a ticket's conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMessage {
  pub message_id:  Uuid,
  pub ticket_id:   Uuid,
  /// `None` when the message was drafted by the assistant.
  pub sender_id:   Option<Uuid>,
  pub body:        String,
  /// Hidden from end users.
  pub is_internal: bool,
  pub is_ai:       bool,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
  pub body:        String,
  #[serde(default)]
  pub is_internal: bool,
  #[serde(default)]
  pub is_ai:       bool,
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn status_spelling_is_stable() {
    let spelled: Vec<String> =
      TicketStatus::iter().map(|s| s.to_string()).collect();
    assert_eq!(spelled, [
      "Open",
      "InProgress",
      "Pending",
      "Resolved",
      "Closed"
    ]);
    assert_eq!(
      serde_json::to_string(&TicketStatus::InProgress).unwrap(),
      "\"InProgress\""
    );
  }

  #[test]
  fn priority_orders_by_urgency() {
    let mut all: Vec<_> = TicketPriority::iter().collect();
    all.reverse();
    all.sort();
    assert_eq!(all, [
      TicketPriority::Low,
      TicketPriority::Medium,
      TicketPriority::High,
      TicketPriority::Urgent,
    ]);
  }

  #[test]
  fn defaults_are_open_and_medium() {
    assert_eq!(TicketStatus::default(), TicketStatus::Open);
    assert_eq!(TicketPriority::default(), TicketPriority::Medium);
    assert_eq!(SupportLevel::default(), SupportLevel::N1);
  }

  #[test]
  fn unknown_status_text_is_rejected() {
    assert!(TicketStatus::from_str("in_progress").is_err());
    assert_eq!(
      TicketStatus::from_str("InProgress").unwrap(),
      TicketStatus::InProgress
    );
  }

  #[test]
  fn support_level_steps_up_to_n3() {
    assert_eq!(SupportLevel::N1.next(), Some(SupportLevel::N2));
    assert_eq!(SupportLevel::N2.next(), Some(SupportLevel::N3));
    assert_eq!(SupportLevel::N3.next(), None);
  }

  #[test]
  fn change_type_uses_snake_case() {
    assert_eq!(ChangeType::StatusChange.as_ref(), "status_change");
    assert_eq!(
      ChangeType::from_str("assignment").unwrap(),
      ChangeType::Assignment
    );
    assert_eq!(
      serde_json::to_string(&ChangeType::StatusChange).unwrap(),
      "\"status_change\""
    );
  }
}
