//! Tests for `SqliteStore` and the `Helpdesk` service against an in-memory
//! database.


use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use helpdesk_core::{
  Helpdesk,
  clock::ManualClock,
  directory::{IssueType, NewLookup, NewUser, User, UserRole},
  identity::Actor,
  ticket::{NewTicket, SupportLevel, TicketPriority},
};

use crate::SqliteStore;

pub(crate) async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

pub(crate) fn epoch() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap()
}

/// A service on a fresh store with a clock pinned at [`epoch`].
pub(crate) async fn helpdesk() -> (Helpdesk<SqliteStore>, Arc<ManualClock>) {
  let clock = Arc::new(ManualClock::new(epoch()));
  let desk = Helpdesk::new(store().await).with_clock(clock.clone());
  (desk, clock)
}

/// Reference rows most ticket tests need.
pub(crate) struct Seed {
  pub issue_type: IssueType,
  pub reporter:   User,
  pub analyst:    User,
}

impl Seed {
  pub fn reporter_actor(&self) -> Actor { Actor::user(self.reporter.user_id, self.reporter.role) }

  pub fn analyst_actor(&self) -> Actor { Actor::user(self.analyst.user_id, self.analyst.role) }
}

pub(crate) async fn seed(desk: &Helpdesk<SqliteStore>) -> Seed {
  let issue_type = desk
    .create_issue_type(NewLookup { name: "Hardware".into(), description: None })
    .await
    .unwrap();
  let reporter = desk
    .create_user(NewUser {
      name:          "Rita Reporter".into(),
      email:         "rita@example.com".into(),
      role:          UserRole::EndUser,
      department_id: None,
      support_level: None,
    })
    .await
    .unwrap();
  let analyst = analyst(desk, "Ana Analyst", SupportLevel::N1).await;
  Seed { issue_type, reporter, analyst }
}

pub(crate) async fn analyst(
  desk: &Helpdesk<SqliteStore>,
  name: &str,
  level: SupportLevel,
) -> User {
  let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
  desk
    .create_user(NewUser {
      name: name.into(),
      email,
      role: UserRole::Analyst,
      department_id: None,
      support_level: Some(level),
    })
    .await
    .unwrap()
}

pub(crate) fn new_ticket(seed: &Seed, title: &str, priority: TicketPriority) -> NewTicket {
  NewTicket {
    title: title.into(),
    description: String::new(),
    priority,
    issue_type_id: seed.issue_type.issue_type_id,
  }
}
