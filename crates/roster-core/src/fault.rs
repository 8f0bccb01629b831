//! Remote faults — the raw failure shape a list store reports.
//!
//! A fault may carry a structured body (the store's JSON error document), a
//! plain message, and a transport status text. Any of them may be missing and
//! the message may itself embed a JSON body after transport diagnostics.

use serde::{Deserialize, Serialize};

/// The raw failure reported by a remote call, before any translation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteFault {
  /// Structured error document, e.g. `{"error": {"message": {"value": ".."}}}`.
  pub body:        Option<serde_json::Value>,
  pub message:     Option<String>,
  pub status_text: Option<String>,
}

impl RemoteFault {
  pub fn from_message(message: impl Into<String>) -> Self {
    Self { message: Some(message.into()), ..Self::default() }
  }

  pub fn from_body(body: serde_json::Value) -> Self {
    Self { body: Some(body), ..Self::default() }
  }

  pub fn with_status_text(mut self, status: impl Into<String>) -> Self {
    self.status_text = Some(status.into());
    self
  }
}

/// Implemented by store error types so callers can inspect the fault shape
/// without knowing the concrete backend.
pub trait Fault: std::error::Error {
  /// The structured view of this error. Defaults to the display text.
  fn fault(&self) -> RemoteFault { RemoteFault::from_message(self.to_string()) }
}
