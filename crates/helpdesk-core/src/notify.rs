//! Outbound ticket events.
//!
//! The service publishes after a change is committed. Delivery is the
//! notifier's business; the service never waits on or checks it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
  Created,
  StatusChanged,
  Assigned,
  Escalated,
  Updated,
  MessagePosted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketEvent {
  pub ticket_id: Uuid,
  #[serde(rename = "type")]
  pub kind:      EventKind,
  pub message:   String,
  pub timestamp: DateTime<Utc>,
}

pub trait Notifier: Send + Sync {
  fn publish(&self, event: TicketEvent);
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
  fn publish(&self, _event: TicketEvent) {}
}
