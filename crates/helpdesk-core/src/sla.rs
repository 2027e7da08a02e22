//! SLA policy: how old a ticket of a given priority may get before it is in
//! breach.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  ticket::{Ticket, TicketPriority},
};

/// Longest threshold accepted: one hundred years.
pub const MAX_THRESHOLD_HOURS: i64 = 100 * 366 * 24;

/// Hours-to-breach per priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaPolicy {
  pub urgent_hours: i64,
  pub high_hours:   i64,
  pub medium_hours: i64,
  pub low_hours:    i64,
}

impl Default for SlaPolicy {
  fn default() -> Self {
    Self {
      urgent_hours: 24,
      high_hours:   72,
      medium_hours: 168,
      low_hours:    336,
    }
  }
}

impl SlaPolicy {
  pub fn threshold_hours(&self, priority: TicketPriority) -> i64 {
    match priority {
      TicketPriority::Urgent => self.urgent_hours,
      TicketPriority::High => self.high_hours,
      TicketPriority::Medium => self.medium_hours,
      TicketPriority::Low => self.low_hours,
    }
  }

  /// `None` when the configured hours do not fit a [`Duration`].
  pub fn threshold(&self, priority: TicketPriority) -> Option<Duration> {
    Duration::try_hours(self.threshold_hours(priority))
  }

  /// Every threshold must lie in `0..=MAX_THRESHOLD_HOURS`.
  pub fn validate(&self) -> Result<()> {
    for (name, hours) in [
      ("urgent_hours", self.urgent_hours),
      ("high_hours", self.high_hours),
      ("medium_hours", self.medium_hours),
      ("low_hours", self.low_hours),
    ] {
      if !(0..=MAX_THRESHOLD_HOURS).contains(&hours) {
        return Err(Error::Invalid(format!(
          "sla.{name} must be between 0 and {MAX_THRESHOLD_HOURS}, got {hours}"
        )));
      }
    }
    Ok(())
  }

  /// True iff the ticket is still open and strictly older than its
  /// priority's threshold at `now`. A threshold too large to represent is
  /// never reached.
  pub fn is_breached(&self, ticket: &Ticket, now: DateTime<Utc>) -> bool {
    !ticket.status.is_terminal()
      && self
        .threshold(ticket.priority)
        .is_some_and(|limit| now - ticket.created_at > limit)
  }
}

/// Ordering for the near-SLA list: most urgent first, then oldest first.
pub fn breach_order(a: &Ticket, b: &Ticket) -> Ordering {
  b.priority
    .cmp(&a.priority)
    .then_with(|| a.created_at.cmp(&b.created_at))
}
