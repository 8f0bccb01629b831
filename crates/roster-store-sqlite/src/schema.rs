//! SQL schema for the Roster SQLite store, and the registry's column set.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

use roster_core::schema::{
  DOCUMENTS_LIST, PERSONS_LIST, PROVIDERS_LIST, TITLE, document, person, provider,
};

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per list item, whatever the list.
CREATE TABLE IF NOT EXISTS items (
    item_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    list        TEXT NOT NULL,
    fields      TEXT NOT NULL,   -- JSON object; multi-valued lookups are arrays
    created_at  TEXT NOT NULL,   -- ISO 8601 UTC
    modified_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS attachments (
    item_id   INTEGER NOT NULL REFERENCES items(item_id) ON DELETE CASCADE,
    file_name TEXT NOT NULL,
    content   BLOB NOT NULL,
    added_at  TEXT NOT NULL,
    PRIMARY KEY (item_id, file_name)
);

-- Column metadata; only columns that need it are declared.
CREATE TABLE IF NOT EXISTS fields (
    list           TEXT NOT NULL,
    internal_name  TEXT NOT NULL,
    title          TEXT NOT NULL,
    type_as_string TEXT NOT NULL,
    allow_multiple INTEGER NOT NULL DEFAULT 0,
    enforce_unique INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (list, internal_name)
);

CREATE INDEX IF NOT EXISTS items_list_idx ON items(list);

PRAGMA user_version = 1;
";

/// A column declaration for [`crate::SqliteStore::define_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
  pub internal_name:  String,
  pub title:          String,
  pub type_as_string: String,
  pub allow_multiple: bool,
  /// Reject writes that would give two items the same value.
  pub enforce_unique: bool,
}

impl FieldDefinition {
  pub fn new(internal_name: &str, type_as_string: &str) -> Self {
    Self {
      internal_name:  internal_name.to_owned(),
      title:          internal_name.to_owned(),
      type_as_string: type_as_string.to_owned(),
      allow_multiple: false,
      enforce_unique: false,
    }
  }

  pub fn titled(mut self, title: &str) -> Self {
    self.title = title.to_owned();
    self
  }

  pub fn multi(mut self) -> Self {
    self.allow_multiple = true;
    self
  }

  pub fn unique(mut self) -> Self {
    self.enforce_unique = true;
    self
  }
}

/// The columns the personnel registry relies on, by list.
///
/// `multi_provider` chooses whether a person may belong to several providers.
pub fn registry_fields(multi_provider: bool) -> Vec<(&'static str, FieldDefinition)> {
  let provider_type = if multi_provider { "LookupMulti" } else { "Lookup" };
  let mut provider_field = FieldDefinition::new(person::PROVIDER, provider_type).titled("Empresa");
  if multi_provider {
    provider_field = provider_field.multi();
  }

  vec![
    (PERSONS_LIST, FieldDefinition::new(TITLE, "Text").titled("Documento").unique()),
    (PERSONS_LIST, provider_field),
    (PERSONS_LIST, FieldDefinition::new(person::ACTIVE, "Boolean")),
    (DOCUMENTS_LIST, FieldDefinition::new(document::EXPIRY, "DateTime")),
    (DOCUMENTS_LIST, FieldDefinition::new(document::ISSUED, "DateTime")),
    (PROVIDERS_LIST, FieldDefinition::new(provider::MEMBERS, "UserMulti").multi()),
  ]
}
