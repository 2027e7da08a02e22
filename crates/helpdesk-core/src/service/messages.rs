//! The per-ticket conversation thread.

use tracing::info;
use uuid::Uuid;

use super::Helpdesk;
use crate::{
  Error, Result,
  identity::Actor,
  notify::{EventKind, TicketEvent},
  store::HelpdeskStore,
  ticket::{NewMessage, TicketMessage},
};

impl<S: HelpdeskStore> Helpdesk<S> {
  /// Append a message to a ticket's thread. `Ok(None)` if the ticket is
  /// absent.
  pub async fn post_message(
    &self,
    ticket_id: Uuid,
    input: NewMessage,
    actor: &Actor,
  ) -> Result<Option<TicketMessage>> {
    let sender_id = match actor {
      Actor::User { user_id, .. } => Some(*user_id),
      Actor::System => None,
      Actor::Anonymous => return Err(Error::Unattributed),
    };
    if input.body.trim().is_empty() {
      return Err(Error::Invalid("message body must not be empty".into()));
    }
    if input.is_internal && !actor.is_staff() {
      return Err(Error::Invalid("only staff can post internal notes".into()));
    }
    let Some(ticket) = self.get_ticket(ticket_id).await? else {
      return Ok(None);
    };

    let message = TicketMessage {
      message_id: Uuid::new_v4(),
      ticket_id,
      sender_id,
      body: input.body,
      is_internal: input.is_internal,
      is_ai: input.is_ai,
      created_at: self.now(),
    };
    self
      .store
      .append_message(message.clone())
      .await
      .map_err(Error::store)?;

    info!(
      ticket_id = %ticket_id, message_id = %message.message_id,
      internal = message.is_internal, ai = message.is_ai,
      "message posted"
    );
    // Internal notes never reach the public event stream.
    if !message.is_internal {
      self.notifier.publish(TicketEvent {
        ticket_id: ticket.ticket_id,
        kind:      EventKind::MessagePosted,
        message:   message.body.clone(),
        timestamp: message.created_at,
      });
    }
    Ok(Some(message))
  }

  /// The thread as `actor` may see it: internal notes only for staff.
  pub async fn messages(
    &self,
    ticket_id: Uuid,
    actor: &Actor,
  ) -> Result<Option<Vec<TicketMessage>>> {
    if self.get_ticket(ticket_id).await?.is_none() {
      return Ok(None);
    }
    let messages = self
      .store
      .list_messages(ticket_id, actor.is_staff())
      .await
      .map_err(Error::store)?;
    Ok(Some(messages))
  }
}
