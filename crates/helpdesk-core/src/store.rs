//! The `HelpdeskStore` trait, the persistence seam.
//!
//! Implemented by storage backends (e.g. `helpdesk-store-sqlite`). The
//! service layer depends on this abstraction only. Stores persist exactly
//! what they are given: ids, timestamps, and versions are assigned by the
//! caller.

use std::future::Future;

use uuid::Uuid;

use crate::{
  directory::{Department, IssueType, Removal, User},
  query::{PageRequest, TicketFilter},
  ticket::{Ticket, TicketHistory, TicketMessage},
};

/// Abstraction over a helpdesk store backend.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded runtime behind `axum`.
pub trait HelpdeskStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Tickets ───────────────────────────────────────────────────────────

  /// Insert a new ticket together with its first audit row, atomically.
  fn insert_ticket(
    &self,
    ticket: Ticket,
    created: TicketHistory,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve a ticket by id. Returns `None` if not found.
  fn get_ticket(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Ticket>, Self::Error>> + Send + '_;

  /// Overwrite a ticket and append `history`, in one transaction, but only
  /// if the stored row is still at `expected_version`.
  ///
  /// Returns `false` (and writes nothing) when the version has moved on or
  /// the ticket is gone.
  fn update_ticket(
    &self,
    ticket: Ticket,
    expected_version: i64,
    history: Vec<TicketHistory>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete a ticket with its history and messages. Returns `false` if it
  /// did not exist.
  fn delete_ticket(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Tickets matching `filter`, newest first, optionally paged.
  fn list_tickets<'a>(
    &'a self,
    filter: &'a TicketFilter,
    page: Option<PageRequest>,
  ) -> impl Future<Output = Result<Vec<Ticket>, Self::Error>> + Send + 'a;

  /// Number of tickets matching `filter`, ignoring paging.
  fn count_tickets<'a>(
    &'a self,
    filter: &'a TicketFilter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── History & messages, append-only ──────────────────────────────────

  /// Audit rows for a ticket, oldest first.
  fn list_history(
    &self,
    ticket_id: Uuid,
  ) -> impl Future<Output = Result<Vec<TicketHistory>, Self::Error>> + Send + '_;

  fn append_message(
    &self,
    message: TicketMessage,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Messages for a ticket in the order they were sent.
  fn list_messages(
    &self,
    ticket_id: Uuid,
    include_internal: bool,
  ) -> impl Future<Output = Result<Vec<TicketMessage>, Self::Error>> + Send + '_;

  // ── Directory ─────────────────────────────────────────────────────────
  //
  // Inserts return `false` when the name (or a user's email) is taken.
  // `set_*_active` returns `false` when the row does not exist.

  fn insert_user(
    &self,
    user: User,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn list_users(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  fn set_user_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Refused while any ticket was created by or is assigned to the user.
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Removal, Self::Error>> + Send + '_;

  fn insert_department(
    &self,
    department: Department,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_department(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Department>, Self::Error>> + Send + '_;

  fn list_departments(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<Department>, Self::Error>> + Send + '_;

  fn set_department_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Refused while any user belongs to the department.
  fn delete_department(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Removal, Self::Error>> + Send + '_;

  fn insert_issue_type(
    &self,
    issue_type: IssueType,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_issue_type(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<IssueType>, Self::Error>> + Send + '_;

  fn list_issue_types(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<IssueType>, Self::Error>> + Send + '_;

  fn set_issue_type_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Refused while any ticket carries the issue type.
  fn delete_issue_type(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Removal, Self::Error>> + Send + '_;
}
