//! Error types for `roster-core`.

use thiserror::Error;

/// Failures decoding list items into domain records.
#[derive(Debug, Error)]
pub enum Error {
  #[error("item {id} is missing required field {field:?}")]
  MissingField { id: i64, field: &'static str },

  #[error("field {field:?} holds an unexpected value: {value}")]
  InvalidValue { field: &'static str, value: String },

  #[error("unknown document label: {0:?}")]
  UnknownDocumentLabel(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
