//! Ticket filtering and pagination parameters.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  ticket::{Ticket, TicketPriority, TicketStatus},
};

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Optional equality filters over tickets. The default matches everything.
///
/// Results are always ordered by `created_at` descending.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
  pub status:          Option<TicketStatus>,
  pub priority:        Option<TicketPriority>,
  pub created_by:      Option<Uuid>,
  pub assigned_to:     Option<Uuid>,
  pub issue_type_id:   Option<Uuid>,
  /// Only tickets created at or before this instant.
  pub created_before:  Option<DateTime<Utc>>,
  /// Exclude `Resolved` and `Closed` tickets.
  pub unresolved_only: bool,
}

impl TicketFilter {
  /// In-memory evaluation of the filter; mirrors what stores do in SQL.
  pub fn matches(&self, t: &Ticket) -> bool {
    self.status.is_none_or(|s| t.status == s)
      && self.priority.is_none_or(|p| t.priority == p)
      && self.created_by.is_none_or(|u| t.created_by == u)
      && self.assigned_to.is_none_or(|u| t.assigned_to == Some(u))
      && self.issue_type_id.is_none_or(|i| t.issue_type_id == i)
      && self.created_before.is_none_or(|at| t.created_at <= at)
      && !(self.unresolved_only && t.status.is_terminal())
  }
}

/// A validated, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  number: u32,
  size:   u32,
}

impl PageRequest {
  pub fn new(number: u32, size: u32) -> Result<Self> {
    if number == 0 {
      return Err(Error::InvalidPage("page_number starts at 1".into()));
    }
    if size == 0 || size > MAX_PAGE_SIZE {
      return Err(Error::InvalidPage(format!(
        "page_size must be between 1 and {MAX_PAGE_SIZE}"
      )));
    }
    Ok(Self { number, size })
  }

  pub fn number(&self) -> u32 { self.number }

  pub fn size(&self) -> u32 { self.size }

  pub fn skip(&self) -> u64 { u64::from(self.number - 1) * u64::from(self.size) }

  pub fn take(&self) -> u64 { u64::from(self.size) }
}

/// One page of tickets plus the unpaged match count.
#[derive(Debug, Clone, Serialize)]
pub struct TicketPage {
  pub items:       Vec<Ticket>,
  pub total_count: u64,
  pub page_number: u32,
  pub page_size:   u32,
}
