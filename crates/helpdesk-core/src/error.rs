//! Error types for `helpdesk-core`.
//!
//! A missing ticket is not an error: operations signal it with `Ok(None)`.

use thiserror::Error;
use uuid::Uuid;

use crate::ticket::SupportLevel;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid page request: {0}")]
  InvalidPage(String),

  #[error("invalid input: {0}")]
  Invalid(String),

  #[error("{kind} not found: {id}")]
  UnknownReference { kind: &'static str, id: Uuid },

  #[error("user {0} is not an active analyst")]
  NotAnAnalyst(Uuid),

  #[error("this operation needs an identified user")]
  Unattributed,

  #[error("cannot escalate from {from} to {to}")]
  InvalidEscalation { from: SupportLevel, to: SupportLevel },

  #[error("ticket {0} is already at the top support level")]
  AtTopLevel(Uuid),

  #[error("ticket {id} was modified concurrently (expected version {expected})")]
  VersionConflict { id: Uuid, expected: i64 },

  #[error("{kind} named {name:?} already exists")]
  DuplicateName { kind: &'static str, name: String },

  #[error("{kind} {id} is still in use")]
  InUse { kind: &'static str, id: Uuid },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
