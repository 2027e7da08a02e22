//! Ticket statistics, recomputed from the full ticket set on every call.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::{
  sla::SlaPolicy,
  ticket::{Ticket, TicketPriority, TicketStatus},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketStatistics {
  pub total:                u64,
  /// Every status appears, including those with a zero count.
  pub by_status:            BTreeMap<String, u64>,
  pub by_priority:          BTreeMap<String, u64>,
  /// Mean creation-to-resolution time over resolved tickets; 0 if none.
  pub avg_resolution_hours: f64,
  pub sla_breached:         u64,
  pub computed_at:          DateTime<Utc>,
}

impl TicketStatistics {
  pub fn compute(tickets: &[Ticket], sla: &SlaPolicy, now: DateTime<Utc>) -> Self {
    let mut by_status: BTreeMap<String, u64> =
      TicketStatus::iter().map(|s| (s.to_string(), 0)).collect();
    let mut by_priority: BTreeMap<String, u64> =
      TicketPriority::iter().map(|p| (p.to_string(), 0)).collect();

    let mut resolved = 0u64;
    let mut resolution_sum = 0.0;
    let mut sla_breached = 0u64;

    for t in tickets {
      *by_status.entry(t.status.to_string()).or_default() += 1;
      *by_priority.entry(t.priority.to_string()).or_default() += 1;

      if let Some(hours) = t.resolution_hours() {
        resolved += 1;
        resolution_sum += hours;
      }
      if sla.is_breached(t, now) {
        sla_breached += 1;
      }
    }

    let avg_resolution_hours = if resolved == 0 {
      0.0
    } else {
      resolution_sum / resolved as f64
    };

    Self {
      total: tickets.len() as u64,
      by_status,
      by_priority,
      avg_resolution_hours,
      sla_breached,
      computed_at: now,
    }
  }
}
