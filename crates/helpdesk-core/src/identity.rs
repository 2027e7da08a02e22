//! The identity on whose behalf an operation runs.
//!
//! Every service call takes an [`Actor`] explicitly; there is no ambient
//! "current user". No authentication happens here: the id is trusted as
//! given.

use serde::Serialize;
use uuid::Uuid;

use crate::directory::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
  /// An unidentified caller of a public endpoint.
  Anonymous,
  /// Automated work (assistant replies, auto-assignment).
  System,
  User { user_id: Uuid, role: UserRole },
}

impl Actor {
  pub fn user(user_id: Uuid, role: UserRole) -> Self { Self::User { user_id, role } }

  /// The id recorded in audit rows, if any.
  pub fn user_id(&self) -> Option<Uuid> {
    match self {
      Self::User { user_id, .. } => Some(*user_id),
      Self::Anonymous | Self::System => None,
    }
  }

  /// Staff may see internal messages.
  pub fn is_staff(&self) -> bool {
    match self {
      Self::User { role, .. } => role.is_staff(),
      Self::System => true,
      Self::Anonymous => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_users_carry_an_id() {
    let id = Uuid::new_v4();
    assert_eq!(Actor::user(id, UserRole::EndUser).user_id(), Some(id));
    assert_eq!(Actor::System.user_id(), None);
    assert_eq!(Actor::Anonymous.user_id(), None);
  }

  #[test]
  fn staff_visibility() {
    let id = Uuid::new_v4();
    assert!(Actor::user(id, UserRole::Analyst).is_staff());
    assert!(Actor::user(id, UserRole::Admin).is_staff());
    assert!(!Actor::user(id, UserRole::EndUser).is_staff());
    assert!(Actor::System.is_staff());
    assert!(!Actor::Anonymous.is_staff());
  }
}
