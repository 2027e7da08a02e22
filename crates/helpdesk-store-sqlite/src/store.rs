//! [`SqliteStore`]: the SQLite implementation of [`HelpdeskStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use helpdesk_core::{
  directory::{Department, IssueType, Removal, User},
  query::{PageRequest, TicketFilter},
  store::HelpdeskStore,
  ticket::{Ticket, TicketHistory, TicketMessage},
};

use crate::{
  Error, Result,
  encode::{
    RawHistory, RawLookup, RawMessage, RawTicket, RawUser, TICKET_COLUMNS,
    USER_COLUMNS, encode_uuid, ticket_where,
  },
  schema::SCHEMA,
};

// ─── Lookup tables ───────────────────────────────────────────────────────────

/// Departments and issue types share a layout; this names the differences.
struct LookupTable {
  table:  &'static str,
  id_col: &'static str,
  /// `SELECT EXISTS(...)` query, bound to the row id, that is true while the
  /// row is still referenced.
  in_use: &'static str,
}

static DEPARTMENTS: LookupTable = LookupTable {
  table:  "departments",
  id_col: "department_id",
  in_use: "SELECT EXISTS(SELECT 1 FROM users WHERE department_id = ?1)",
};

static ISSUE_TYPES: LookupTable = LookupTable {
  table:  "issue_types",
  id_col: "issue_type_id",
  in_use: "SELECT EXISTS(SELECT 1 FROM tickets WHERE issue_type_id = ?1)",
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A helpdesk store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised through the connection's worker thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Lookup helpers ────────────────────────────────────────────────────────

  async fn insert_lookup(&self, t: &'static LookupTable, raw: RawLookup) -> Result<bool> {
    let inserted = self
      .conn
      .call(move |conn| {
        let taken: bool = conn.query_row(
          &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE name = ?1)", t.table),
          rusqlite::params![raw.name],
          |r| r.get(0),
        )?;
        if taken {
          return Ok(false);
        }
        conn.execute(
          &format!(
            "INSERT INTO {} ({}, name, description, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            t.table, t.id_col
          ),
          rusqlite::params![raw.id, raw.name, raw.description, raw.is_active, raw.created_at],
        )?;
        Ok(true)
      })
      .await?;
    Ok(inserted)
  }

  async fn get_lookup(&self, t: &'static LookupTable, id: Uuid) -> Result<Option<RawLookup>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {id}, name, description, is_active, created_at
                 FROM {table} WHERE {id} = ?1",
                id = t.id_col,
                table = t.table
              ),
              rusqlite::params![id_str],
              RawLookup::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(raw)
  }

  async fn list_lookup(&self, t: &'static LookupTable, active_only: bool) -> Result<Vec<RawLookup>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {}, name, description, is_active, created_at
           FROM {} WHERE (?1 = 0 OR is_active = 1) ORDER BY name",
          t.id_col, t.table
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![active_only], RawLookup::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws)
  }

  async fn set_lookup_active(&self, t: &'static LookupTable, id: Uuid, active: bool) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("UPDATE {} SET is_active = ?1 WHERE {} = ?2", t.table, t.id_col),
          rusqlite::params![active, id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_lookup(&self, t: &'static LookupTable, id: Uuid) -> Result<Removal> {
    let id_str = encode_uuid(id);
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let in_use: bool = tx.query_row(t.in_use, rusqlite::params![id_str], |r| r.get(0))?;
        if in_use {
          return Ok(Removal::InUse);
        }
        let removed = tx.execute(
          &format!("DELETE FROM {} WHERE {} = ?1", t.table, t.id_col),
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(if removed > 0 { Removal::Removed } else { Removal::NotFound })
      })
      .await?;
    Ok(outcome)
  }
}

// ─── HelpdeskStore impl ──────────────────────────────────────────────────────

impl HelpdeskStore for SqliteStore {
  type Error = Error;

  // ── Tickets ───────────────────────────────────────────────────────────────

  async fn insert_ticket(&self, ticket: Ticket, created: TicketHistory) -> Result<()> {
    let t = RawTicket::from_ticket(&ticket);
    let h = RawHistory::from_history(&created);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!(
            "INSERT INTO tickets ({TICKET_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
          ),
          rusqlite::params![
            t.ticket_id,
            t.title,
            t.description,
            t.status,
            t.priority,
            t.issue_type_id,
            t.created_by,
            t.assigned_to,
            t.support_level,
            t.created_at,
            t.updated_at,
            t.resolved_at,
            t.version,
          ],
        )?;
        h.insert(&tx)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTicket> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = ?1"),
              rusqlite::params![id_str],
              RawTicket::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTicket::into_ticket).transpose()
  }

  async fn update_ticket(
    &self,
    ticket: Ticket,
    expected_version: i64,
    history: Vec<TicketHistory>,
  ) -> Result<bool> {
    let t = RawTicket::from_ticket(&ticket);
    let rows: Vec<RawHistory> = history.iter().map(RawHistory::from_history).collect();

    let applied = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE tickets SET
             title = ?1, description = ?2, status = ?3, priority = ?4,
             issue_type_id = ?5, assigned_to = ?6, support_level = ?7,
             updated_at = ?8, resolved_at = ?9, version = ?10
           WHERE ticket_id = ?11 AND version = ?12",
          rusqlite::params![
            t.title,
            t.description,
            t.status,
            t.priority,
            t.issue_type_id,
            t.assigned_to,
            t.support_level,
            t.updated_at,
            t.resolved_at,
            t.version,
            t.ticket_id,
            expected_version,
          ],
        )?;
        // Dropping the transaction rolls it back.
        if changed == 0 {
          return Ok(false);
        }
        for row in &rows {
          row.insert(&tx)?;
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;
    Ok(applied)
  }

  async fn delete_ticket(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM tickets WHERE ticket_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn list_tickets(
    &self,
    filter: &TicketFilter,
    page: Option<PageRequest>,
  ) -> Result<Vec<Ticket>> {
    let (where_clause, params) = ticket_where(filter);
    let paging = page
      .map(|p| format!("LIMIT {} OFFSET {}", p.take(), p.skip()))
      .unwrap_or_default();
    let sql = format!(
      "SELECT {TICKET_COLUMNS} FROM tickets
       {where_clause}
       ORDER BY created_at DESC, ticket_id DESC
       {paging}"
    );

    let raws: Vec<RawTicket> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawTicket::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTicket::into_ticket).collect()
  }

  async fn count_tickets(&self, filter: &TicketFilter) -> Result<u64> {
    let (where_clause, params) = ticket_where(filter);
    let sql = format!("SELECT COUNT(*) FROM tickets {where_clause}");

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(params.iter()), |r| r.get(0))?)
      })
      .await?;
    Ok(count.max(0) as u64)
  }

  // ── History & messages ────────────────────────────────────────────────────

  async fn list_history(&self, ticket_id: Uuid) -> Result<Vec<TicketHistory>> {
    let id_str = encode_uuid(ticket_id);
    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT history_id, ticket_id, changed_by, change_type,
                  description, old_value, new_value, created_at
           FROM ticket_history
           WHERE ticket_id = ?1
           ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawHistory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistory::into_history).collect()
  }

  async fn append_message(&self, message: TicketMessage) -> Result<()> {
    let m = RawMessage::from_message(&message);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO ticket_messages (
             message_id, ticket_id, sender_id, body, is_internal, is_ai, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            m.message_id,
            m.ticket_id,
            m.sender_id,
            m.body,
            m.is_internal,
            m.is_ai,
            m.created_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_messages(
    &self,
    ticket_id: Uuid,
    include_internal: bool,
  ) -> Result<Vec<TicketMessage>> {
    let id_str = encode_uuid(ticket_id);
    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT message_id, ticket_id, sender_id, body, is_internal, is_ai, created_at
           FROM ticket_messages
           WHERE ticket_id = ?1 AND (?2 = 1 OR is_internal = 0)
           ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, include_internal], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn insert_user(&self, user: User) -> Result<bool> {
    let u = RawUser::from_user(&user);
    let inserted = self
      .conn
      .call(move |conn| {
        let taken: bool = conn.query_row(
          "SELECT EXISTS(SELECT 1 FROM users WHERE name = ?1 OR email = ?2)",
          rusqlite::params![u.name, u.email],
          |r| r.get(0),
        )?;
        if taken {
          return Ok(false);
        }
        conn.execute(
          &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
          rusqlite::params![
            u.user_id,
            u.name,
            u.email,
            u.role,
            u.department_id,
            u.support_level,
            u.is_active,
            u.created_at,
          ],
        )?;
        Ok(true)
      })
      .await?;
    Ok(inserted)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self, active_only: bool) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users
           WHERE (?1 = 0 OR is_active = 1)
           ORDER BY name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![active_only], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn set_user_active(&self, id: Uuid, active: bool) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET is_active = ?1 WHERE user_id = ?2",
          rusqlite::params![active, id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_user(&self, id: Uuid) -> Result<Removal> {
    let id_str = encode_uuid(id);
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let in_use: bool = tx.query_row(
          "SELECT EXISTS(
             SELECT 1 FROM tickets WHERE created_by = ?1 OR assigned_to = ?1
           )",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;
        if in_use {
          return Ok(Removal::InUse);
        }
        let removed =
          tx.execute("DELETE FROM users WHERE user_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(if removed > 0 { Removal::Removed } else { Removal::NotFound })
      })
      .await?;
    Ok(outcome)
  }

  // ── Departments ───────────────────────────────────────────────────────────

  async fn insert_department(&self, department: Department) -> Result<bool> {
    self
      .insert_lookup(&DEPARTMENTS, RawLookup::from_department(&department))
      .await
  }

  async fn get_department(&self, id: Uuid) -> Result<Option<Department>> {
    self
      .get_lookup(&DEPARTMENTS, id)
      .await?
      .map(RawLookup::into_department)
      .transpose()
  }

  async fn list_departments(&self, active_only: bool) -> Result<Vec<Department>> {
    self
      .list_lookup(&DEPARTMENTS, active_only)
      .await?
      .into_iter()
      .map(RawLookup::into_department)
      .collect()
  }

  async fn set_department_active(&self, id: Uuid, active: bool) -> Result<bool> {
    self.set_lookup_active(&DEPARTMENTS, id, active).await
  }

  async fn delete_department(&self, id: Uuid) -> Result<Removal> {
    self.delete_lookup(&DEPARTMENTS, id).await
  }

  // ── Issue types ───────────────────────────────────────────────────────────

  async fn insert_issue_type(&self, issue_type: IssueType) -> Result<bool> {
    self
      .insert_lookup(&ISSUE_TYPES, RawLookup::from_issue_type(&issue_type))
      .await
  }

  async fn get_issue_type(&self, id: Uuid) -> Result<Option<IssueType>> {
    self
      .get_lookup(&ISSUE_TYPES, id)
      .await?
      .map(RawLookup::into_issue_type)
      .transpose()
  }

  async fn list_issue_types(&self, active_only: bool) -> Result<Vec<IssueType>> {
    self
      .list_lookup(&ISSUE_TYPES, active_only)
      .await?
      .into_iter()
      .map(RawLookup::into_issue_type)
      .collect()
  }

  async fn set_issue_type_active(&self, id: Uuid, active: bool) -> Result<bool> {
    self.set_lookup_active(&ISSUE_TYPES, id, active).await
  }

  async fn delete_issue_type(&self, id: Uuid) -> Result<Removal> {
    self.delete_lookup(&ISSUE_TYPES, id).await
  }
}
