//! Error type for `roster-form`.

use roster_core::fault::{Fault, RemoteFault};
use thiserror::Error;

/// Why a form operation did not complete.
#[derive(Debug, Clone, Error)]
pub enum FormError {
  /// Missing or invalid user input. Shown inline as-is; the user can fix it.
  #[error("{0}")]
  Validation(String),

  /// A record the operation relies on does not exist or could not be
  /// resolved.
  #[error("{0}")]
  Integrity(String),

  /// Any failure reported by the store, duplicate-key violations included.
  #[error("remote fault: {}", describe_fault(.0))]
  Remote(RemoteFault),
}

fn describe_fault(f: &RemoteFault) -> String {
  f.message
    .clone()
    .or_else(|| f.body.as_ref().map(ToString::to_string))
    .or_else(|| f.status_text.clone())
    .unwrap_or_default()
}

impl FormError {
  pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

  pub fn integrity(msg: impl Into<String>) -> Self { Self::Integrity(msg.into()) }

  /// Wrap a store error, keeping its structured fault.
  pub fn remote<E: Fault>(e: E) -> Self { Self::Remote(e.fault()) }

  /// The fault shape handed to [`crate::translate::friendly_message`].
  pub fn to_fault(&self) -> RemoteFault {
    match self {
      Self::Remote(f) => f.clone(),
      Self::Validation(m) | Self::Integrity(m) => RemoteFault::from_message(m.clone()),
    }
  }
}

impl From<roster_core::Error> for FormError {
  fn from(e: roster_core::Error) -> Self { Self::Integrity(e.to_string()) }
}

pub type Result<T, E = FormError> = std::result::Result<T, E>;
