//! [`SqliteStore`] — the SQLite implementation of [`ListStore`].

use std::path::Path;

use bytes::Bytes;
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use serde_json::Value;

use roster_core::{
  item::{AddOutcome, AttachmentInfo, FieldMetadata, Fields, Item, ItemId, UserRef},
  query::ListQuery,
  store::{Identity, ListStore},
};

use crate::{
  Error, Result,
  encode::{RawItem, compile_query, encode_dt, json_path, normalize_fields, scalar_value},
  schema::{FieldDefinition, SCHEMA, registry_fields},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A list store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:         tokio_rusqlite::Connection,
  current_user: Option<UserRef>,
}

/// A uniqueness violation found while writing, reported as (field, value).
type Conflict = Option<(String, String)>;

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, current_user: None };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, current_user: None };
    store.init_schema().await?;
    Ok(store)
  }

  /// The user reported by [`Identity::current_user`].
  pub fn with_current_user(mut self, user: UserRef) -> Self {
    self.current_user = Some(user);
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Declare (or redeclare) a column's metadata.
  pub async fn define_field(&self, list: &str, def: FieldDefinition) -> Result<()> {
    let list = list.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO fields
             (list, internal_name, title, type_as_string, allow_multiple, enforce_unique)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            list,
            def.internal_name,
            def.title,
            def.type_as_string,
            def.allow_multiple,
            def.enforce_unique,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Declare every column the personnel registry relies on.
  pub async fn provision_registry(&self, multi_provider: bool) -> Result<()> {
    for (list, def) in registry_fields(multi_provider) {
      self.define_field(list, def).await?;
    }
    Ok(())
  }

  /// Write `fields` as a new item or merged into `existing`, refusing the
  /// write if a unique column would collide with another item.
  ///
  /// Returns the item id, or the colliding (field, value).
  async fn write_item(
    &self,
    list: &str,
    existing: Option<ItemId>,
    fields: Fields,
  ) -> Result<std::result::Result<ItemId, (String, String)>> {
    let list = list.to_owned();
    let fields = normalize_fields(fields);
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let mut merged = match existing {
          Some(id) => {
            let raw: Option<String> = tx
              .query_row(
                "SELECT fields FROM items WHERE item_id = ?1 AND list = ?2",
                rusqlite::params![id, list],
                |r| r.get(0),
              )
              .optional()?;
            match raw {
              Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                _ => Fields::new(),
              },
              None => return Ok(None),
            }
          }
          None => Fields::new(),
        };
        merged.extend(fields);

        let conflict: Conflict = {
          let mut unique_stmt = tx.prepare(
            "SELECT internal_name FROM fields WHERE list = ?1 AND enforce_unique = 1",
          )?;
          let unique_cols = unique_stmt
            .query_map(rusqlite::params![list], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          let mut found = None;
          for col in unique_cols {
            let Some(value) = merged.get(&col).and_then(scalar_value) else { continue };
            let clash: bool = tx
              .query_row(
                "SELECT 1 FROM items
                 WHERE list = ?1 AND item_id != ?2 AND json_extract(fields, ?3) = ?4
                 LIMIT 1",
                rusqlite::params![list, existing.unwrap_or(-1), json_path(&col), value],
                |_| Ok(true),
              )
              .optional()?
              .unwrap_or(false);
            if clash {
              let shown = merged.get(&col).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
              });
              found = Some((col, shown.unwrap_or_default()));
              break;
            }
          }
          found
        };
        if let Some(c) = conflict {
          return Ok(Some(Err(c)));
        }

        let json = Value::Object(merged).to_string();
        let id = match existing {
          Some(id) => {
            tx.execute(
              "UPDATE items SET fields = ?1, modified_at = ?2 WHERE item_id = ?3",
              rusqlite::params![json, now, id],
            )?;
            id
          }
          None => {
            tx.execute(
              "INSERT INTO items (list, fields, created_at, modified_at)
               VALUES (?1, ?2, ?3, ?3)",
              rusqlite::params![list, json, now],
            )?;
            tx.last_insert_rowid()
          }
        };
        tx.commit()?;
        Ok(Some(Ok(id)))
      })
      .await?;

    outcome.ok_or_else(|| Error::ItemNotFound {
      list: String::new(),
      id:   existing.unwrap_or_default(),
    })
  }

  async fn ensure_item(&self, list: &str, id: ItemId) -> Result<()> {
    let list_owned = list.to_owned();
    let exists: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM items WHERE item_id = ?1 AND list = ?2",
              rusqlite::params![id, list_owned],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    if exists { Ok(()) } else { Err(Error::ItemNotFound { list: list.to_owned(), id }) }
  }
}

fn attachment_url(list: &str, id: ItemId, file_name: &str) -> String {
  format!("/Lists/{list}/Attachments/{id}/{file_name}")
}

fn duplicate(list: &str, (field, value): (String, String)) -> Error {
  Error::DuplicateValue { list: list.to_owned(), field, value }
}

// ─── ListStore impl ──────────────────────────────────────────────────────────

impl ListStore for SqliteStore {
  type Error = Error;

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn query(&self, list: &str, query: &ListQuery) -> Result<Vec<Item>> {
    let compiled = compile_query(list, query)?;
    tracing::debug!(list, query = ?query.filter.as_ref().map(ToString::to_string), "query");

    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&compiled.sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(compiled.params.iter()), |row| {
            Ok(RawItem { item_id: row.get(0)?, fields: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|r| r.into_item(&query.select)).collect()
  }

  async fn add_item(&self, list: &str, fields: Fields) -> Result<AddOutcome> {
    let id = self.write_item(list, None, fields).await?.map_err(|c| duplicate(list, c))?;
    tracing::debug!(list, id, "item added");
    Ok(AddOutcome { id: Some(id) })
  }

  async fn update_item(&self, list: &str, id: ItemId, fields: Fields) -> Result<()> {
    match self.write_item(list, Some(id), fields).await {
      Ok(Ok(_)) => Ok(()),
      Ok(Err(c)) => Err(duplicate(list, c)),
      Err(Error::ItemNotFound { .. }) => Err(Error::ItemNotFound { list: list.to_owned(), id }),
      Err(e) => Err(e),
    }
  }

  async fn delete_item(&self, list: &str, id: ItemId) -> Result<()> {
    let list_owned = list.to_owned();
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM attachments WHERE item_id = ?1", rusqlite::params![id])?;
        let n = tx.execute(
          "DELETE FROM items WHERE item_id = ?1 AND list = ?2",
          rusqlite::params![id, list_owned],
        )?;
        tx.commit()?;
        Ok(n)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::ItemNotFound { list: list.to_owned(), id });
    }
    tracing::debug!(list, id, "item deleted");
    Ok(())
  }

  // ── Attachments ───────────────────────────────────────────────────────────

  async fn list_attachments(&self, list: &str, id: ItemId) -> Result<Vec<AttachmentInfo>> {
    self.ensure_item(list, id).await?;

    let names: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT file_name FROM attachments WHERE item_id = ?1 ORDER BY added_at, file_name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      names
        .into_iter()
        .map(|file_name| AttachmentInfo {
          server_relative_url: attachment_url(list, id, &file_name),
          file_name,
        })
        .collect(),
    )
  }

  async fn add_attachment(
    &self,
    list: &str,
    id: ItemId,
    file_name: &str,
    content: Bytes,
  ) -> Result<AttachmentInfo> {
    self.ensure_item(list, id).await?;

    let name = file_name.to_owned();
    let at = encode_dt(Utc::now());
    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT OR IGNORE INTO attachments (item_id, file_name, content, added_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id, name, content.as_ref(), at],
        )?;
        Ok(n)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::AttachmentExists { id, file_name: file_name.to_owned() });
    }
    Ok(AttachmentInfo {
      file_name:           file_name.to_owned(),
      server_relative_url: attachment_url(list, id, file_name),
    })
  }

  async fn delete_attachment(&self, list: &str, id: ItemId, file_name: &str) -> Result<()> {
    self.ensure_item(list, id).await?;

    let name = file_name.to_owned();
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM attachments WHERE item_id = ?1 AND file_name = ?2",
          rusqlite::params![id, name],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::AttachmentNotFound { id, file_name: file_name.to_owned() });
    }
    Ok(())
  }

  // ── Metadata ──────────────────────────────────────────────────────────────

  async fn field(&self, list: &str, name: &str) -> Result<Option<FieldMetadata>> {
    let list = list.to_owned();
    let name = name.to_owned();
    let meta = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT internal_name, type_as_string, allow_multiple FROM fields
               WHERE list = ?1 AND (internal_name = ?2 OR title = ?2)
               ORDER BY internal_name = ?2 DESC
               LIMIT 1",
              rusqlite::params![list, name],
              |r| {
                Ok(FieldMetadata {
                  internal_name:         r.get(0)?,
                  type_as_string:        r.get(1)?,
                  allow_multiple_values: r.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(meta)
  }
}

impl Identity for SqliteStore {
  async fn current_user(&self) -> Result<UserRef> { self.current_user.ok_or(Error::NoSession) }
}
