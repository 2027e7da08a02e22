//! JSON REST API for the helpdesk.
//!
//! Exposes an axum [`Router`] backed by a [`Helpdesk`] service over any
//! [`HelpdeskStore`]. Authentication, TLS, and transport concerns are the
//! caller's responsibility; the caller's identity arrives in headers (see
//! [`identity`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! let events = Arc::new(EventHub::new());
//! let desk = Arc::new(Helpdesk::new(store).with_notifier(events.clone()));
//! let app = Router::new().nest("/api", helpdesk_api::api_router(desk, events));
//! ```

pub mod directory;
pub mod error;
pub mod events;
pub mod extract;
pub mod identity;
pub mod messages;
pub mod tickets;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use helpdesk_core::{Helpdesk, store::HelpdeskStore};

pub use error::ApiError;
pub use events::EventHub;
pub use identity::Caller;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub desk:   Arc<Helpdesk<S>>,
  pub events: Arc<EventHub>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { desk: self.desk.clone(), events: self.events.clone() }
  }
}

/// Build a fully-materialised API router.
///
/// `events` should be the same hub `desk` publishes to, or the event
/// streams stay silent. The returned `Router<()>` can be nested into any
/// parent router regardless of its own state type.
pub fn api_router<S>(desk: Arc<Helpdesk<S>>, events: Arc<EventHub>) -> Router<()>
where
  S: HelpdeskStore + 'static,
{
  Router::new()
    // Tickets
    .route("/tickets", get(tickets::list::<S>).post(tickets::create::<S>))
    .route("/tickets/page", get(tickets::page::<S>))
    .route("/tickets/near-sla", get(tickets::near_sla::<S>))
    .route("/tickets/stats", get(tickets::stats::<S>))
    .route(
      "/tickets/{id}",
      get(tickets::get_one::<S>)
        .patch(tickets::update::<S>)
        .delete(tickets::delete_one::<S>),
    )
    .route("/tickets/{id}/assign", post(tickets::assign::<S>))
    .route("/tickets/{id}/status", post(tickets::set_status::<S>))
    .route("/tickets/{id}/escalate", post(tickets::escalate::<S>))
    .route("/tickets/{id}/history", get(tickets::history::<S>))
    // Conversation
    .route(
      "/tickets/{id}/messages",
      get(messages::list::<S>).post(messages::post_one::<S>),
    )
    .route("/tickets/{id}/events", get(events::stream::<S>))
    // Directory
    .route("/users", get(directory::list_users::<S>).post(directory::create_user::<S>))
    .route(
      "/users/{id}",
      get(directory::get_user::<S>).delete(directory::delete_user::<S>),
    )
    .route("/users/{id}/active", post(directory::set_user_active::<S>))
    .route(
      "/departments",
      get(directory::list_departments::<S>).post(directory::create_department::<S>),
    )
    .route(
      "/departments/{id}",
      get(directory::get_department::<S>).delete(directory::delete_department::<S>),
    )
    .route("/departments/{id}/active", post(directory::set_department_active::<S>))
    .route(
      "/issue-types",
      get(directory::list_issue_types::<S>).post(directory::create_issue_type::<S>),
    )
    .route(
      "/issue-types/{id}",
      get(directory::get_issue_type::<S>).delete(directory::delete_issue_type::<S>),
    )
    .route("/issue-types/{id}/active", post(directory::set_issue_type_active::<S>))
    .with_state(ApiState { desk, events })
}
