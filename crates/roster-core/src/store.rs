//! The `ListStore` and `Identity` traits.
//!
//! The traits are implemented by storage backends (e.g. `roster-store-sqlite`).
//! The form component depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use bytes::Bytes;

use crate::{
  fault::Fault,
  item::{AddOutcome, AttachmentInfo, FieldMetadata, Fields, Item, ItemId, UserRef},
  query::ListQuery,
};

// ─── ListStore ───────────────────────────────────────────────────────────────

/// Abstraction over a remote store of named lists.
///
/// Writes are last-write-wins; there is no transaction across calls.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait ListStore: Send + Sync {
  type Error: Fault + Send + Sync + 'static;

  // ── Items ─────────────────────────────────────────────────────────────

  /// Run `query` against `list` and return the matching items.
  fn query<'a>(
    &'a self,
    list: &'a str,
    query: &'a ListQuery,
  ) -> impl Future<Output = Result<Vec<Item>, Self::Error>> + Send + 'a;

  /// Create an item. The outcome may or may not carry the new identifier.
  fn add_item<'a>(
    &'a self,
    list: &'a str,
    fields: Fields,
  ) -> impl Future<Output = Result<AddOutcome, Self::Error>> + Send + 'a;

  /// Merge `fields` into an existing item; unspecified fields are kept.
  fn update_item<'a>(
    &'a self,
    list: &'a str,
    id: ItemId,
    fields: Fields,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove an item together with its attachments.
  fn delete_item<'a>(
    &'a self,
    list: &'a str,
    id: ItemId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Attachments ───────────────────────────────────────────────────────

  fn list_attachments<'a>(
    &'a self,
    list: &'a str,
    id: ItemId,
  ) -> impl Future<Output = Result<Vec<AttachmentInfo>, Self::Error>> + Send + 'a;

  fn add_attachment<'a>(
    &'a self,
    list: &'a str,
    id: ItemId,
    file_name: &'a str,
    content: Bytes,
  ) -> impl Future<Output = Result<AttachmentInfo, Self::Error>> + Send + 'a;

  fn delete_attachment<'a>(
    &'a self,
    list: &'a str,
    id: ItemId,
    file_name: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Metadata ──────────────────────────────────────────────────────────

  /// Look up a column by internal name or display title. Returns `None` if
  /// the list has no such column.
  fn field<'a>(
    &'a self,
    list: &'a str,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<FieldMetadata>, Self::Error>> + Send + 'a;
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// The session's identity provider, served by the same backend as the lists.
pub trait Identity: ListStore {
  fn current_user(&self) -> impl Future<Output = Result<UserRef, Self::Error>> + Send + '_;
}
