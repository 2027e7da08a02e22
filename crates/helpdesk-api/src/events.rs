//! Live ticket events: a per-ticket broadcast hub and its SSE endpoint.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tickets/:id/events` | `text/event-stream`; 404 if the ticket does not exist |

use std::{
  collections::HashMap,
  convert::Infallible,
  sync::{PoisonError, RwLock},
  time::Duration,
};

use axum::{
  extract::{Path, State},
  response::sse::{Event, KeepAlive, Sse},
};
use helpdesk_core::{
  notify::{Notifier, TicketEvent},
  store::HelpdeskStore,
};
use tokio::sync::broadcast;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

const CHANNEL_CAPACITY: usize = 64;

/// Fan-out of [`TicketEvent`]s to whoever is listening on each ticket.
///
/// Channels are created on first use and dropped once a publish finds no
/// receivers left. Subscribers that fall behind lose the oldest events.
#[derive(Debug, Default)]
pub struct EventHub {
  channels: RwLock<HashMap<Uuid, broadcast::Sender<TicketEvent>>>,
}

impl EventHub {
  pub fn new() -> Self { Self::default() }

  pub fn subscribe(&self, ticket_id: Uuid) -> broadcast::Receiver<TicketEvent> {
    let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
    channels
      .entry(ticket_id)
      .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
      .subscribe()
  }

  /// Number of tickets with an open channel.
  pub fn channel_count(&self) -> usize {
    self.channels.read().unwrap_or_else(PoisonError::into_inner).len()
  }
}

impl Notifier for EventHub {
  fn publish(&self, event: TicketEvent) {
    let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
    let ticket_id = event.ticket_id;
    let sender = channels
      .entry(ticket_id)
      .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
    match sender.send(event) {
      Ok(receivers) => debug!(%ticket_id, receivers, "event published"),
      Err(_) => {
        channels.remove(&ticket_id);
      }
    }
  }
}

/// `GET /tickets/:id/events`
pub async fn stream<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError>
where
  S: HelpdeskStore + 'static,
{
  if state.desk.get_ticket(id).await?.is_none() {
    return Err(ApiError::NotFound(format!("ticket {id} not found")));
  }
  debug!(ticket_id = %id, "event stream opened");

  let events = BroadcastStream::new(state.events.subscribe(id)).filter_map(move |item| {
    match item {
      Ok(event) => match Event::default().event("ticket").json_data(&event) {
        Ok(sse) => Some(Ok(sse)),
        Err(e) => {
          warn!(ticket_id = %id, error = %e, "could not encode event");
          None
        }
      },
      Err(lagged) => {
        warn!(ticket_id = %id, error = %lagged, "event subscriber lagged");
        None
      }
    }
  });

  Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
