//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC strings with fixed microsecond precision, so
//! they sort correctly as text. Enums are stored by their exact variant
//! spelling. UUIDs are stored as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use helpdesk_core::{
  directory::{Department, IssueType, User},
  query::TicketFilter,
  ticket::{Ticket, TicketHistory, TicketMessage},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ──────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

/// Parse an enum column by its variant spelling.
fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

// ─── Tickets ─────────────────────────────────────────────────────────────────

pub const TICKET_COLUMNS: &str = "ticket_id, title, description, status, priority, \
   issue_type_id, created_by, assigned_to, support_level, created_at, updated_at, \
   resolved_at, version";

/// Raw column values of a `tickets` row, in [`TICKET_COLUMNS`] order.
pub struct RawTicket {
  pub ticket_id:     String,
  pub title:         String,
  pub description:   String,
  pub status:        String,
  pub priority:      String,
  pub issue_type_id: String,
  pub created_by:    String,
  pub assigned_to:   Option<String>,
  pub support_level: String,
  pub created_at:    String,
  pub updated_at:    String,
  pub resolved_at:   Option<String>,
  pub version:       i64,
}

impl RawTicket {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ticket_id:     row.get(0)?,
      title:         row.get(1)?,
      description:   row.get(2)?,
      status:        row.get(3)?,
      priority:      row.get(4)?,
      issue_type_id: row.get(5)?,
      created_by:    row.get(6)?,
      assigned_to:   row.get(7)?,
      support_level: row.get(8)?,
      created_at:    row.get(9)?,
      updated_at:    row.get(10)?,
      resolved_at:   row.get(11)?,
      version:       row.get(12)?,
    })
  }

  pub fn from_ticket(t: &Ticket) -> Self {
    Self {
      ticket_id:     encode_uuid(t.ticket_id),
      title:         t.title.clone(),
      description:   t.description.clone(),
      status:        t.status.as_ref().to_owned(),
      priority:      t.priority.as_ref().to_owned(),
      issue_type_id: encode_uuid(t.issue_type_id),
      created_by:    encode_uuid(t.created_by),
      assigned_to:   t.assigned_to.map(encode_uuid),
      support_level: t.support_level.as_ref().to_owned(),
      created_at:    encode_dt(t.created_at),
      updated_at:    encode_dt(t.updated_at),
      resolved_at:   t.resolved_at.map(encode_dt),
      version:       t.version,
    }
  }

  pub fn into_ticket(self) -> Result<Ticket> {
    Ok(Ticket {
      ticket_id:     decode_uuid(&self.ticket_id)?,
      title:         self.title,
      description:   self.description,
      status:        decode_enum("ticket status", &self.status)?,
      priority:      decode_enum("ticket priority", &self.priority)?,
      issue_type_id: decode_uuid(&self.issue_type_id)?,
      created_by:    decode_uuid(&self.created_by)?,
      assigned_to:   decode_opt_uuid(self.assigned_to)?,
      support_level: decode_enum("support level", &self.support_level)?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
      resolved_at:   decode_opt_dt(self.resolved_at)?,
      version:       self.version,
    })
  }
}

/// Build the `WHERE` clause and its positional parameters for `filter`.
///
/// Every parameter is text; the clause is empty when nothing is filtered.
pub fn ticket_where(filter: &TicketFilter) -> (String, Vec<String>) {
  let mut conds: Vec<&'static str> = vec![];
  let mut params: Vec<String> = vec![];

  if let Some(status) = filter.status {
    conds.push("status = ?");
    params.push(status.as_ref().to_owned());
  }
  if let Some(priority) = filter.priority {
    conds.push("priority = ?");
    params.push(priority.as_ref().to_owned());
  }
  if let Some(user) = filter.created_by {
    conds.push("created_by = ?");
    params.push(encode_uuid(user));
  }
  if let Some(user) = filter.assigned_to {
    conds.push("assigned_to = ?");
    params.push(encode_uuid(user));
  }
  if let Some(issue_type) = filter.issue_type_id {
    conds.push("issue_type_id = ?");
    params.push(encode_uuid(issue_type));
  }
  if let Some(before) = filter.created_before {
    conds.push("created_at <= ?");
    params.push(encode_dt(before));
  }
  if filter.unresolved_only {
    conds.push("status NOT IN ('Resolved', 'Closed')");
  }

  let clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (clause, params)
}

// ─── History ─────────────────────────────────────────────────────────────────

pub struct RawHistory {
  pub history_id:  String,
  pub ticket_id:   String,
  pub changed_by:  Option<String>,
  pub change_type: String,
  pub description: String,
  pub old_value:   Option<String>,
  pub new_value:   Option<String>,
  pub created_at:  String,
}

impl RawHistory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      history_id:  row.get(0)?,
      ticket_id:   row.get(1)?,
      changed_by:  row.get(2)?,
      change_type: row.get(3)?,
      description: row.get(4)?,
      old_value:   row.get(5)?,
      new_value:   row.get(6)?,
      created_at:  row.get(7)?,
    })
  }

  pub fn from_history(h: &TicketHistory) -> Self {
    Self {
      history_id:  encode_uuid(h.history_id),
      ticket_id:   encode_uuid(h.ticket_id),
      changed_by:  h.changed_by.map(encode_uuid),
      change_type: h.change_type.as_ref().to_owned(),
      description: h.description.clone(),
      old_value:   h.old_value.clone(),
      new_value:   h.new_value.clone(),
      created_at:  encode_dt(h.created_at),
    }
  }

  pub fn into_history(self) -> Result<TicketHistory> {
    Ok(TicketHistory {
      history_id:  decode_uuid(&self.history_id)?,
      ticket_id:   decode_uuid(&self.ticket_id)?,
      changed_by:  decode_opt_uuid(self.changed_by)?,
      change_type: decode_enum("change type", &self.change_type)?,
      description: self.description,
      old_value:   self.old_value,
      new_value:   self.new_value,
      created_at:  decode_dt(&self.created_at)?,
    })
  }

  pub fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO ticket_history (
         history_id, ticket_id, changed_by, change_type,
         description, old_value, new_value, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      rusqlite::params![
        self.history_id,
        self.ticket_id,
        self.changed_by,
        self.change_type,
        self.description,
        self.old_value,
        self.new_value,
        self.created_at,
      ],
    )?;
    Ok(())
  }
}

// ─── Messages ────────────────────────────────────────────────────────────────

pub struct RawMessage {
  pub message_id:  String,
  pub ticket_id:   String,
  pub sender_id:   Option<String>,
  pub body:        String,
  pub is_internal: bool,
  pub is_ai:       bool,
  pub created_at:  String,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id:  row.get(0)?,
      ticket_id:   row.get(1)?,
      sender_id:   row.get(2)?,
      body:        row.get(3)?,
      is_internal: row.get(4)?,
      is_ai:       row.get(5)?,
      created_at:  row.get(6)?,
    })
  }

  pub fn from_message(m: &TicketMessage) -> Self {
    Self {
      message_id:  encode_uuid(m.message_id),
      ticket_id:   encode_uuid(m.ticket_id),
      sender_id:   m.sender_id.map(encode_uuid),
      body:        m.body.clone(),
      is_internal: m.is_internal,
      is_ai:       m.is_ai,
      created_at:  encode_dt(m.created_at),
    }
  }

  pub fn into_message(self) -> Result<TicketMessage> {
    Ok(TicketMessage {
      message_id:  decode_uuid(&self.message_id)?,
      ticket_id:   decode_uuid(&self.ticket_id)?,
      sender_id:   decode_opt_uuid(self.sender_id)?,
      body:        self.body,
      is_internal: self.is_internal,
      is_ai:       self.is_ai,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

// ─── Directory ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "user_id, name, email, role, department_id, support_level, is_active, created_at";

pub struct RawUser {
  pub user_id:       String,
  pub name:          String,
  pub email:         String,
  pub role:          String,
  pub department_id: Option<String>,
  pub support_level: Option<String>,
  pub is_active:     bool,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      name:          row.get(1)?,
      email:         row.get(2)?,
      role:          row.get(3)?,
      department_id: row.get(4)?,
      support_level: row.get(5)?,
      is_active:     row.get(6)?,
      created_at:    row.get(7)?,
    })
  }

  pub fn from_user(u: &User) -> Self {
    Self {
      user_id:       encode_uuid(u.user_id),
      name:          u.name.clone(),
      email:         u.email.clone(),
      role:          u.role.as_ref().to_owned(),
      department_id: u.department_id.map(encode_uuid),
      support_level: u.support_level.map(|l| l.as_ref().to_owned()),
      is_active:     u.is_active,
      created_at:    encode_dt(u.created_at),
    }
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      name:          self.name,
      email:         self.email,
      role:          decode_enum("user role", &self.role)?,
      department_id: decode_opt_uuid(self.department_id)?,
      support_level: self
        .support_level
        .as_deref()
        .map(|s| decode_enum("support level", s))
        .transpose()?,
      is_active:     self.is_active,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Departments and issue types share one row shape.
pub struct RawLookup {
  pub id:          String,
  pub name:        String,
  pub description: Option<String>,
  pub is_active:   bool,
  pub created_at:  String,
}

impl RawLookup {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      description: row.get(2)?,
      is_active:   row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn from_department(d: &Department) -> Self {
    Self {
      id:          encode_uuid(d.department_id),
      name:        d.name.clone(),
      description: d.description.clone(),
      is_active:   d.is_active,
      created_at:  encode_dt(d.created_at),
    }
  }

  pub fn from_issue_type(i: &IssueType) -> Self {
    Self {
      id:          encode_uuid(i.issue_type_id),
      name:        i.name.clone(),
      description: i.description.clone(),
      is_active:   i.is_active,
      created_at:  encode_dt(i.created_at),
    }
  }

  pub fn into_department(self) -> Result<Department> {
    Ok(Department {
      department_id: decode_uuid(&self.id)?,
      name:          self.name,
      description:   self.description,
      is_active:     self.is_active,
      created_at:    decode_dt(&self.created_at)?,
    })
  }

  pub fn into_issue_type(self) -> Result<IssueType> {
    Ok(IssueType {
      issue_type_id: decode_uuid(&self.id)?,
      name:          self.name,
      description:   self.description,
      is_active:     self.is_active,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use helpdesk_core::ticket::{TicketPriority, TicketStatus};

  use super::*;

  #[test]
  fn timestamps_sort_as_text() {
    let whole = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let later = whole + chrono::Duration::milliseconds(5);
    let (a, b) = (encode_dt(whole), encode_dt(later));
    assert_eq!(a, "2025-01-01T00:00:00.000000Z");
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap(), later);
  }

  #[test]
  fn empty_filter_has_no_where_clause() {
    let (clause, params) = ticket_where(&TicketFilter::default());
    assert!(clause.is_empty());
    assert!(params.is_empty());
  }

  #[test]
  fn filter_params_follow_condition_order() {
    let assignee = Uuid::new_v4();
    let filter = TicketFilter {
      status: Some(TicketStatus::InProgress),
      priority: Some(TicketPriority::Urgent),
      assigned_to: Some(assignee),
      unresolved_only: true,
      ..Default::default()
    };
    let (clause, params) = ticket_where(&filter);
    assert_eq!(
      clause,
      "WHERE status = ? AND priority = ? AND assigned_to = ? \
       AND status NOT IN ('Resolved', 'Closed')"
    );
    assert_eq!(params, ["InProgress".to_owned(), "Urgent".to_owned(), encode_uuid(assignee)]);
  }

  #[test]
  fn unknown_enum_text_is_a_decode_error() {
    let err = decode_enum::<TicketStatus>("ticket status", "open").unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
  }
}
