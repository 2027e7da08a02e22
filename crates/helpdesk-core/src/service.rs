//! [`Helpdesk`]: ticket lifecycle operations over any [`HelpdeskStore`].
//!
//! Every mutation follows the same shape: load, check the caller's
//! `if_match` version, apply, then commit the new row together with its
//! audit rows in one conditional store write. Events go out only after the
//! commit succeeds.

mod directory;
mod messages;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  clock::{Clock, SystemClock},
  directory::UserRole,
  identity::Actor,
  notify::{EventKind, NoopNotifier, Notifier, TicketEvent},
  query::{PageRequest, TicketFilter, TicketPage},
  sla::{SlaPolicy, breach_order},
  stats::TicketStatistics,
  store::HelpdeskStore,
  ticket::{
    ChangeType, Escalation, NewTicket, SupportLevel, Ticket, TicketHistory,
    TicketPatch, TicketStatus,
  },
};

pub struct Helpdesk<S> {
  store:    S,
  clock:    Arc<dyn Clock>,
  notifier: Arc<dyn Notifier>,
  sla:      SlaPolicy,
}

impl<S: HelpdeskStore> Helpdesk<S> {
  /// A service on the system clock, the default SLA table, and no
  /// notifications.
  pub fn new(store: S) -> Self {
    Self {
      store,
      clock: Arc::new(SystemClock),
      notifier: Arc::new(NoopNotifier),
      sla: SlaPolicy::default(),
    }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn with_sla(mut self, sla: SlaPolicy) -> Self {
    self.sla = sla;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn sla(&self) -> &SlaPolicy { &self.sla }

  pub fn now(&self) -> DateTime<Utc> { self.clock.now() }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
    self.store.get_ticket(id).await.map_err(Error::store)
  }

  pub async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
    debug!(?filter, "listing tickets");
    self.store.list_tickets(filter, None).await.map_err(Error::store)
  }

  pub async fn page_tickets(
    &self,
    filter: &TicketFilter,
    page: PageRequest,
  ) -> Result<TicketPage> {
    debug!(?filter, ?page, "paging tickets");
    let total_count = self.store.count_tickets(filter).await.map_err(Error::store)?;
    let items = self
      .store
      .list_tickets(filter, Some(page))
      .await
      .map_err(Error::store)?;
    Ok(TicketPage {
      items,
      total_count,
      page_number: page.number(),
      page_size: page.size(),
    })
  }

  /// Unresolved tickets at least `threshold_hours` old that are already
  /// past their SLA, most urgent and oldest first.
  pub async fn near_sla(&self, threshold_hours: i64) -> Result<Vec<Ticket>> {
    if threshold_hours < 0 {
      return Err(Error::Invalid("threshold_hours must not be negative".into()));
    }
    let now = self.now();
    let created_before = Duration::try_hours(threshold_hours)
      .and_then(|age| now.checked_sub_signed(age))
      .ok_or_else(|| Error::Invalid(format!("threshold_hours {threshold_hours} is out of range")))?;
    let filter = TicketFilter {
      created_before: Some(created_before),
      unresolved_only: true,
      ..Default::default()
    };
    let mut tickets = self.store.list_tickets(&filter, None).await.map_err(Error::store)?;
    tickets.retain(|t| self.sla.is_breached(t, now));
    tickets.sort_by(breach_order);
    Ok(tickets)
  }

  pub async fn statistics(&self) -> Result<TicketStatistics> {
    let tickets = self
      .store
      .list_tickets(&TicketFilter::default(), None)
      .await
      .map_err(Error::store)?;
    Ok(TicketStatistics::compute(&tickets, &self.sla, self.now()))
  }

  /// Audit rows for a ticket, or `None` if the ticket does not exist.
  pub async fn history(&self, id: Uuid) -> Result<Option<Vec<TicketHistory>>> {
    if self.get_ticket(id).await?.is_none() {
      return Ok(None);
    }
    let rows = self.store.list_history(id).await.map_err(Error::store)?;
    Ok(Some(rows))
  }

  // ── Creation & editing ────────────────────────────────────────────────

  pub async fn create_ticket(&self, input: NewTicket, actor: &Actor) -> Result<Ticket> {
    let creator = actor.user_id().ok_or(Error::Unattributed)?;
    let title = input.title.trim();
    if title.is_empty() {
      return Err(Error::Invalid("title must not be empty".into()));
    }
    if self.store.get_user(creator).await.map_err(Error::store)?.is_none() {
      return Err(Error::UnknownReference { kind: "user", id: creator });
    }
    self.require_issue_type(input.issue_type_id).await?;

    let now = self.now();
    let ticket = Ticket {
      ticket_id:     Uuid::new_v4(),
      title:         title.to_owned(),
      description:   input.description,
      status:        TicketStatus::default(),
      priority:      input.priority,
      issue_type_id: input.issue_type_id,
      created_by:    creator,
      assigned_to:   None,
      support_level: SupportLevel::default(),
      created_at:    now,
      updated_at:    now,
      resolved_at:   None,
      version:       1,
    };
    let created = self.audit(
      &ticket,
      actor,
      ChangeType::Created,
      "ticket created",
      None,
      Some(ticket.status.to_string()),
    );

    self
      .store
      .insert_ticket(ticket.clone(), created)
      .await
      .map_err(Error::store)?;

    info!(ticket_id = %ticket.ticket_id, priority = %ticket.priority, "ticket created");
    self.emit(&ticket, EventKind::Created, format!("Ticket \"{}\" created", ticket.title));
    Ok(ticket)
  }

  pub async fn update_ticket(
    &self,
    id: Uuid,
    patch: TicketPatch,
    actor: &Actor,
    if_match: Option<i64>,
  ) -> Result<Option<Ticket>> {
    let Some(mut ticket) = self.load(id, if_match).await? else {
      return Ok(None);
    };
    if patch.is_empty() {
      return Ok(Some(ticket));
    }

    let mut changes = Vec::new();

    if let Some(title) = patch.title {
      let title = title.trim().to_owned();
      if title.is_empty() {
        return Err(Error::Invalid("title must not be empty".into()));
      }
      if title != ticket.title {
        let old = std::mem::replace(&mut ticket.title, title.clone());
        changes.push(("title changed", Some(old), Some(title)));
      }
    }
    if let Some(description) = patch.description
      && description != ticket.description
    {
      ticket.description = description;
      changes.push(("description changed", None, None));
    }
    if let Some(priority) = patch.priority
      && priority != ticket.priority
    {
      let old = std::mem::replace(&mut ticket.priority, priority);
      changes.push((
        "priority changed",
        Some(old.to_string()),
        Some(priority.to_string()),
      ));
    }
    if let Some(issue_type_id) = patch.issue_type_id
      && issue_type_id != ticket.issue_type_id
    {
      self.require_issue_type(issue_type_id).await?;
      let old = std::mem::replace(&mut ticket.issue_type_id, issue_type_id);
      changes.push((
        "issue type changed",
        Some(old.to_string()),
        Some(issue_type_id.to_string()),
      ));
    }

    if changes.is_empty() {
      return Ok(Some(ticket));
    }

    ticket.updated_at = self.now();
    let history = changes
      .into_iter()
      .map(|(what, old, new)| self.audit(&ticket, actor, ChangeType::Update, what, old, new))
      .collect();

    let ticket = self.commit(ticket, history).await?;
    info!(ticket_id = %id, "ticket updated");
    self.emit(&ticket, EventKind::Updated, "Ticket details updated".to_owned());
    Ok(Some(ticket))
  }

  pub async fn delete_ticket(&self, id: Uuid) -> Result<bool> {
    let removed = self.store.delete_ticket(id).await.map_err(Error::store)?;
    if removed {
      info!(ticket_id = %id, "ticket deleted");
    }
    Ok(removed)
  }

  // ── State transitions ─────────────────────────────────────────────────

  /// Assign a ticket to an analyst. `Ok(None)` if the ticket is absent, in
  /// which case nothing is written.
  pub async fn assign(
    &self,
    id: Uuid,
    analyst_id: Uuid,
    actor: &Actor,
    if_match: Option<i64>,
  ) -> Result<Option<Ticket>> {
    let Some(mut ticket) = self.load(id, if_match).await? else {
      return Ok(None);
    };
    self.require_analyst(analyst_id).await?;

    let old = ticket.assigned_to.replace(analyst_id);
    ticket.updated_at = self.now();
    let history = vec![self.assignment_audit(&ticket, actor, old, analyst_id)];

    let ticket = self.commit(ticket, history).await?;
    info!(ticket_id = %id, analyst_id = %analyst_id, "ticket assigned");
    self.emit(&ticket, EventKind::Assigned, format!("Ticket assigned to {analyst_id}"));
    Ok(Some(ticket))
  }

  /// Move a ticket to `status`. Always records one `status_change` row,
  /// even when the status does not actually change.
  pub async fn update_status(
    &self,
    id: Uuid,
    status: TicketStatus,
    actor: &Actor,
    if_match: Option<i64>,
  ) -> Result<Option<Ticket>> {
    let Some(mut ticket) = self.load(id, if_match).await? else {
      return Ok(None);
    };

    let now = self.now();
    let old = ticket.status;
    ticket.status = status;
    ticket.updated_at = now;
    if status.is_terminal() {
      ticket.resolved_at = Some(now);
    } else {
      ticket.resolved_at = None;
    }

    let history = vec![self.audit(
      &ticket,
      actor,
      ChangeType::StatusChange,
      format!("status changed from {old} to {status}"),
      Some(old.to_string()),
      Some(status.to_string()),
    )];

    let ticket = self.commit(ticket, history).await?;
    info!(ticket_id = %id, from = %old, to = %status, "ticket status changed");
    self.emit(&ticket, EventKind::StatusChanged, format!("Status changed to {status}"));
    Ok(Some(ticket))
  }

  /// Raise a ticket's support level and (re)assign it.
  pub async fn escalate(
    &self,
    id: Uuid,
    escalation: Escalation,
    actor: &Actor,
    if_match: Option<i64>,
  ) -> Result<Option<Ticket>> {
    let Some(mut ticket) = self.load(id, if_match).await? else {
      return Ok(None);
    };
    let reason = escalation.reason.trim();
    if reason.is_empty() {
      return Err(Error::Invalid("an escalation needs a reason".into()));
    }

    let from = ticket.support_level;
    let to = match escalation.target_level {
      Some(level) => level,
      None => from.next().ok_or(Error::AtTopLevel(id))?,
    };
    if to <= from {
      warn!(ticket_id = %id, %from, %to, "escalation rejected");
      return Err(Error::InvalidEscalation { from, to });
    }

    let assignee = match escalation.assign_to {
      Some(analyst_id) => {
        self.require_analyst(analyst_id).await?;
        Some(analyst_id)
      }
      None => self.least_loaded_analyst(to).await?,
    };

    ticket.support_level = to;
    ticket.updated_at = self.now();

    let mut history = vec![self.audit(
      &ticket,
      actor,
      ChangeType::Escalation,
      reason,
      Some(from.to_string()),
      Some(to.to_string()),
    )];
    if let Some(analyst_id) = assignee
      && ticket.assigned_to != Some(analyst_id)
    {
      let old = ticket.assigned_to.replace(analyst_id);
      history.push(self.assignment_audit(&ticket, actor, old, analyst_id));
    }

    let ticket = self.commit(ticket, history).await?;
    info!(
      ticket_id = %id, %from, %to, assigned_to = ?ticket.assigned_to,
      "ticket escalated"
    );
    self.emit(&ticket, EventKind::Escalated, format!("Escalated to {to}: {reason}"));
    Ok(Some(ticket))
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  /// Load a ticket and check the caller's expected version.
  async fn load(&self, id: Uuid, if_match: Option<i64>) -> Result<Option<Ticket>> {
    let Some(ticket) = self.get_ticket(id).await? else {
      return Ok(None);
    };
    if let Some(expected) = if_match
      && expected != ticket.version
    {
      warn!(ticket_id = %id, expected, actual = ticket.version, "stale if-match");
      return Err(Error::VersionConflict { id, expected });
    }
    Ok(Some(ticket))
  }

  /// Persist `ticket` (still carrying the version it was read at) with its
  /// audit rows, and return it at its new version.
  async fn commit(&self, mut ticket: Ticket, history: Vec<TicketHistory>) -> Result<Ticket> {
    let expected = ticket.version;
    ticket.version += 1;
    let applied = self
      .store
      .update_ticket(ticket.clone(), expected, history)
      .await
      .map_err(Error::store)?;
    if !applied {
      warn!(ticket_id = %ticket.ticket_id, expected, "concurrent ticket update");
      return Err(Error::VersionConflict { id: ticket.ticket_id, expected });
    }
    Ok(ticket)
  }

  async fn require_issue_type(&self, id: Uuid) -> Result<()> {
    match self.store.get_issue_type(id).await.map_err(Error::store)? {
      None => Err(Error::UnknownReference { kind: "issue type", id }),
      Some(it) if !it.is_active => {
        Err(Error::Invalid(format!("issue type {:?} is inactive", it.name)))
      }
      Some(_) => Ok(()),
    }
  }

  async fn require_analyst(&self, id: Uuid) -> Result<()> {
    let user = self
      .store
      .get_user(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::UnknownReference { kind: "user", id })?;
    if !user.is_active || !user.role.is_staff() {
      return Err(Error::NotAnAnalyst(id));
    }
    Ok(())
  }

  /// The active analyst at `level` with the fewest unresolved assigned
  /// tickets; ties go to the alphabetically first name.
  async fn least_loaded_analyst(&self, level: SupportLevel) -> Result<Option<Uuid>> {
    let analysts = self.store.list_users(true).await.map_err(Error::store)?;
    let mut best: Option<(u64, String, Uuid)> = None;
    for user in analysts {
      if user.role != UserRole::Analyst || user.support_level != Some(level) {
        continue;
      }
      let filter = TicketFilter {
        assigned_to: Some(user.user_id),
        unresolved_only: true,
        ..Default::default()
      };
      let load = self.store.count_tickets(&filter).await.map_err(Error::store)?;
      let candidate = (load, user.name, user.user_id);
      if best.as_ref().is_none_or(|b| (candidate.0, &candidate.1) < (b.0, &b.1)) {
        best = Some(candidate);
      }
    }
    Ok(best.map(|(_, _, id)| id))
  }

  fn audit(
    &self,
    ticket: &Ticket,
    actor: &Actor,
    change_type: ChangeType,
    description: impl Into<String>,
    old_value: Option<String>,
    new_value: Option<String>,
  ) -> TicketHistory {
    TicketHistory {
      history_id: Uuid::new_v4(),
      ticket_id: ticket.ticket_id,
      changed_by: actor.user_id(),
      change_type,
      description: description.into(),
      old_value,
      new_value,
      created_at: ticket.updated_at,
    }
  }

  fn assignment_audit(
    &self,
    ticket: &Ticket,
    actor: &Actor,
    old: Option<Uuid>,
    new: Uuid,
  ) -> TicketHistory {
    self.audit(
      ticket,
      actor,
      ChangeType::Assignment,
      "assignee changed",
      old.map(|u| u.to_string()),
      Some(new.to_string()),
    )
  }

  fn emit(&self, ticket: &Ticket, kind: EventKind, message: String) {
    self.notifier.publish(TicketEvent {
      ticket_id: ticket.ticket_id,
      kind,
      message,
      timestamp: ticket.updated_at,
    });
  }
}
