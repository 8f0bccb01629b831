//! Error type for `roster-store-sqlite`.

use roster_core::{
  fault::{Fault, RemoteFault},
  item::ItemId,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("item {id} not found in list {list:?}")]
  ItemNotFound { list: String, id: ItemId },

  #[error("attachment {file_name:?} not found on item {id}")]
  AttachmentNotFound { id: ItemId, file_name: String },

  #[error("attachment {file_name:?} already exists on item {id}")]
  AttachmentExists { id: ItemId, file_name: String },

  /// A unique column already holds this value on another item.
  #[error("duplicate value {value:?} for field {field:?} in list {list:?}")]
  DuplicateValue { list: String, field: String, value: String },

  #[error("invalid field name: {0:?}")]
  InvalidFieldName(String),

  #[error("field values must be a JSON object")]
  NotAnObject,

  #[error("no signed-in user")]
  NoSession,
}

impl Fault for Error {
  fn fault(&self) -> RemoteFault {
    match self {
      Error::DuplicateValue { field, .. } => RemoteFault::from_body(json!({
        "error": {
          "code": "DuplicateValuesFound",
          "message": {
            "lang": "es-ES",
            "value": format!("Valores duplicados encontrados en el campo {field}."),
          },
        },
      }))
      .with_status_text("Bad Request"),
      Error::ItemNotFound { .. } | Error::AttachmentNotFound { .. } => {
        RemoteFault::from_message(self.to_string()).with_status_text("Not Found")
      }
      other => RemoteFault::from_message(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
