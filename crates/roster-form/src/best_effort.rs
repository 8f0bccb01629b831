//! Outcome of operations whose failure must not stop the caller.
//!
//! Cleaning up stale attachments, pre-loading option lists and per-row
//! documentation writes during a modify all degrade instead of failing. The
//! reason is kept so callers and tests can see that something was skipped.

use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort<T> {
  Ok(T),
  Ignored(String),
}

impl<T> BestEffort<T> {
  /// Absorb `result`, logging the failure at `warn`.
  pub fn absorb<E: Display>(what: &str, result: Result<T, E>) -> Self {
    match result {
      Ok(v) => Self::Ok(v),
      Err(e) => {
        tracing::warn!(%e, "{what} failed; continuing");
        Self::Ignored(e.to_string())
      }
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BestEffort<U> {
    match self {
      Self::Ok(v) => BestEffort::Ok(f(v)),
      Self::Ignored(reason) => BestEffort::Ignored(reason),
    }
  }

  pub fn is_ignored(&self) -> bool { matches!(self, Self::Ignored(_)) }

  pub fn ok(self) -> Option<T> {
    match self {
      Self::Ok(v) => Some(v),
      Self::Ignored(_) => None,
    }
  }
}
