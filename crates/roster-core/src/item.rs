//! Generic list items — the shape every record takes on the wire.
//!
//! The remote store knows nothing about people or documents. It holds lists of
//! items, each a numeric identifier plus a map of field values. Domain records
//! in [`crate::person`], [`crate::document`] and [`crate::provider`] are
//! encoded into and decoded from this shape.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Store-assigned identifier of a list item.
pub type ItemId = i64;

/// Field name → value map sent to and received from the store.
pub type Fields = Map<String, Value>;

// ─── Item ────────────────────────────────────────────────────────────────────

/// A single row read back from a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
  pub id:     ItemId,
  pub fields: Fields,
}

impl Item {
  pub fn new(id: ItemId, fields: Fields) -> Self { Self { id, fields } }

  /// Text value of `field`, or `None` when absent, null or not a string.
  pub fn text(&self, field: &str) -> Option<&str> {
    self.fields.get(field).and_then(Value::as_str)
  }

  /// Like [`Item::text`] but fails when the field is missing or blank.
  pub fn required_text(&self, field: &'static str) -> Result<&str> {
    self
      .text(field)
      .filter(|s| !s.trim().is_empty())
      .ok_or(Error::MissingField { id: self.id, field })
  }

  /// Boolean value of `field`; `0`/`1` are accepted as well.
  pub fn flag(&self, field: &str) -> Option<bool> {
    match self.fields.get(field)? {
      Value::Bool(b) => Some(*b),
      Value::Number(n) => n.as_i64().map(|n| n != 0),
      _ => None,
    }
  }

  /// All integer ids held by a lookup field, whether single or multi-valued.
  pub fn lookup_ids(&self, field: &str) -> Vec<ItemId> {
    match self.fields.get(field) {
      Some(Value::Number(n)) => n.as_i64().into_iter().collect(),
      Some(Value::Array(values)) => values.iter().filter_map(Value::as_i64).collect(),
      Some(Value::Object(obj)) => obj
        .get("results")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default(),
      _ => Vec::new(),
    }
  }
}

// ─── Write results ───────────────────────────────────────────────────────────

/// What a store hands back after `add`.
///
/// Some backends omit the identifier from write responses; callers that need
/// it must be prepared to re-query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOutcome {
  pub id: Option<ItemId>,
}

// ─── Attachments ─────────────────────────────────────────────────────────────

/// Metadata of a file attached to a list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInfo {
  pub file_name:           String,
  /// Path relative to the site root, e.g. `/Lists/Documentacion/Attachments/7/a.pdf`.
  pub server_relative_url: String,
}

/// A file chosen by the user but not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
  pub name:    String,
  pub content: Bytes,
}

impl PendingFile {
  pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
    Self { name: name.into(), content: content.into() }
  }
}

// ─── Field metadata ──────────────────────────────────────────────────────────

/// Shape of a list column as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
  pub internal_name:         String,
  pub type_as_string:        String,
  pub allow_multiple_values: bool,
}

impl FieldMetadata {
  /// Whether writes to this field must use the multi-valued payload shape.
  ///
  /// Some backends only reveal multiplicity through the type name
  /// (`LookupMulti`, `UserMulti`), so both signals are honoured.
  pub fn is_multi(&self) -> bool {
    self.allow_multiple_values || self.type_as_string.to_lowercase().contains("multi")
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
  pub id: i64,
}
