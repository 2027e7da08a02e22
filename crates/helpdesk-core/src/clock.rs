//! Time source for SLA evaluation and audit stamps.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock that only moves when told to. Used by tests that need exact ages.
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
  pub fn new(start: DateTime<Utc>) -> Self { Self { now: Mutex::new(start) } }

  pub fn set(&self, at: DateTime<Utc>) { *self.lock() = at; }

  pub fn advance(&self, by: Duration) { *self.lock() += by; }

  fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
    // A poisoned clock still holds a valid instant.
    self.now.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> { *self.lock() }
}
