//! SQL schema for the helpdesk SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Enum columns hold the exact variant spelling (`InProgress`, `Urgent`,
/// `N2`); the CHECK constraints pin it.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS departments (
    department_id TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE COLLATE NOCASE,
    description   TEXT,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    role          TEXT NOT NULL CHECK (role IN ('EndUser', 'Analyst', 'Admin')),
    department_id TEXT REFERENCES departments(department_id) ON DELETE RESTRICT,
    support_level TEXT CHECK (support_level IN ('N1', 'N2', 'N3')),
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS issue_types (
    issue_type_id TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE COLLATE NOCASE,
    description   TEXT,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tickets (
    ticket_id     TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    status        TEXT NOT NULL DEFAULT 'Open'
                  CHECK (status IN ('Open', 'InProgress', 'Pending', 'Resolved', 'Closed')),
    priority      TEXT NOT NULL DEFAULT 'Medium'
                  CHECK (priority IN ('Low', 'Medium', 'High', 'Urgent')),
    issue_type_id TEXT NOT NULL REFERENCES issue_types(issue_type_id) ON DELETE RESTRICT,
    created_by    TEXT NOT NULL REFERENCES users(user_id) ON DELETE RESTRICT,
    assigned_to   TEXT REFERENCES users(user_id) ON DELETE RESTRICT,
    support_level TEXT NOT NULL DEFAULT 'N1' CHECK (support_level IN ('N1', 'N2', 'N3')),
    created_at    TEXT NOT NULL,   -- RFC 3339 UTC, fixed microsecond precision
    updated_at    TEXT NOT NULL,
    resolved_at   TEXT,
    version       INTEGER NOT NULL DEFAULT 1
);

-- Append-only; rows only disappear with their ticket.
CREATE TABLE IF NOT EXISTS ticket_history (
    history_id  TEXT PRIMARY KEY,
    ticket_id   TEXT NOT NULL REFERENCES tickets(ticket_id) ON DELETE CASCADE,
    changed_by  TEXT,
    change_type TEXT NOT NULL,   -- 'created' | 'status_change' | 'assignment' | ...
    description TEXT NOT NULL,
    old_value   TEXT,
    new_value   TEXT,
    created_at  TEXT NOT NULL
);

-- Append-only; rows only disappear with their ticket.
CREATE TABLE IF NOT EXISTS ticket_messages (
    message_id  TEXT PRIMARY KEY,
    ticket_id   TEXT NOT NULL REFERENCES tickets(ticket_id) ON DELETE CASCADE,
    sender_id   TEXT,
    body        TEXT NOT NULL,
    is_internal INTEGER NOT NULL DEFAULT 0,
    is_ai       INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS tickets_created_idx  ON tickets(created_at);
CREATE INDEX IF NOT EXISTS tickets_status_idx   ON tickets(status);
CREATE INDEX IF NOT EXISTS tickets_assignee_idx ON tickets(assigned_to);
CREATE INDEX IF NOT EXISTS history_ticket_idx   ON ticket_history(ticket_id);
CREATE INDEX IF NOT EXISTS messages_ticket_idx  ON ticket_messages(ticket_id);

PRAGMA user_version = 1;
";
