//! Which provider the form acts for, and how to write that relationship.
//!
//! In locked mode the provider is detected from the signed-in user's
//! membership and cannot be changed. In editable mode the user picks it from
//! the full catalog. Either way the relationship column may be single- or
//! multi-valued, which changes the shape of the write payload.

use std::collections::HashMap;

use roster_core::{
  item::{FieldMetadata, Fields, ItemId},
  provider::Provider,
  query::{Filter, ListQuery, Order},
  schema::{PERSONS_LIST, PROVIDERS_LIST, TITLE, person, provider as col},
  store::{Identity, ListStore},
};
use serde_json::json;

use crate::{BestEffort, FormError, error::Result};

/// Upper bound on the provider catalog loaded for the selector.
pub const CATALOG_LIMIT: usize = 5000;

// ─── Relationship shape ──────────────────────────────────────────────────────

/// How the person → provider column is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipShape {
  pub internal_name: String,
  pub multi:         bool,
}

impl Default for RelationshipShape {
  fn default() -> Self { Self { internal_name: person::PROVIDER.to_owned(), multi: false } }
}

impl RelationshipShape {
  pub fn from_metadata(meta: &FieldMetadata) -> Self {
    Self { internal_name: meta.internal_name.clone(), multi: meta.is_multi() }
  }

  /// Column that takes the id payload on writes.
  pub fn id_column(&self) -> String { format!("{}Id", self.internal_name) }

  /// Field a read filter compares provider ids against.
  pub fn filter_field(&self) -> String {
    if self.multi { format!("{}/Id", self.internal_name) } else { self.id_column() }
  }
}

/// A provider value shaped for its column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRef {
  Single(ItemId),
  Multi(Vec<ItemId>),
}

impl ProviderRef {
  pub fn for_shape(shape: &RelationshipShape, id: ItemId) -> Self {
    if shape.multi { Self::Multi(vec![id]) } else { Self::Single(id) }
  }
}

/// `{"<col>Id": id}` for single columns, `{"<col>Id": {"results": [ids]}}`
/// for multi-valued ones.
pub fn relationship_payload(shape: &RelationshipShape, value: &ProviderRef) -> Fields {
  let mut f = Fields::new();
  let v = match value {
    ProviderRef::Single(id) => json!(id),
    ProviderRef::Multi(ids) => json!({ "results": ids }),
  };
  f.insert(shape.id_column(), v);
  f
}

// ─── Fetches ─────────────────────────────────────────────────────────────────

/// The full catalog, by name.
pub async fn fetch_options<S: ListStore>(store: &S) -> Result<Vec<Provider>> {
  let q = ListQuery::new()
    .select(Provider::SELECT.iter().copied())
    .order_by(TITLE, Order::Ascending)
    .top(CATALOG_LIMIT);
  let items = store.query(PROVIDERS_LIST, &q).await.map_err(FormError::remote)?;
  Ok(items.iter().filter_map(|it| Provider::from_item(it).ok()).collect())
}

/// Shape of the relationship column, or `None` if the list lacks it.
pub async fn fetch_shape<S: ListStore>(store: &S) -> Result<Option<RelationshipShape>> {
  let meta = store.field(PERSONS_LIST, person::PROVIDER).await.map_err(FormError::remote)?;
  Ok(meta.as_ref().map(RelationshipShape::from_metadata))
}

/// The provider whose members include the signed-in user.
///
/// Tries the expanded multi-valued membership first and falls back to the
/// flat id column when that finds nothing.
pub async fn detect_for_user<S: Identity>(store: &S) -> Result<Option<Provider>> {
  let me = store.current_user().await.map_err(FormError::remote)?;
  let by = |field: &str| {
    ListQuery::new()
      .select(Provider::SELECT.iter().copied())
      .filter(Filter::eq(field, me.id))
      .top(1)
  };

  let expanded = by(col::MEMBERS_EXPANDED_ID);
  let first = BestEffort::absorb(
    "membership lookup",
    store.query(PROVIDERS_LIST, &expanded).await,
  )
  .ok()
  .unwrap_or_default();

  let items = if first.is_empty() {
    let flat = by(col::MEMBERS_ID);
    store.query(PROVIDERS_LIST, &flat).await.map_err(FormError::remote)?
  } else {
    first
  };
  items.first().map(Provider::from_item).transpose().map_err(FormError::from)
}

// ─── Resolver state ──────────────────────────────────────────────────────────

/// Provider selection state owned by one form instance.
#[derive(Debug, Default)]
pub struct ProviderResolver {
  locked:   bool,
  options:  Vec<Provider>,
  names:    HashMap<ItemId, String>,
  selected: Option<ItemId>,
  shape:    Option<RelationshipShape>,
}

impl ProviderResolver {
  pub fn new(locked: bool) -> Self { Self { locked, ..Self::default() } }

  pub fn is_locked(&self) -> bool { self.locked }

  pub fn options(&self) -> &[Provider] { &self.options }

  pub fn selected(&self) -> Option<ItemId> { self.selected }

  pub fn selected_name(&self) -> Option<&str> {
    self.selected.and_then(|id| self.names.get(&id)).map(String::as_str)
  }

  pub fn set_options(&mut self, options: Vec<Provider>) {
    for p in &options {
      self.names.insert(p.id, p.name.clone());
    }
    self.options = options;
  }

  pub fn set_shape(&mut self, shape: Option<RelationshipShape>) { self.shape = shape; }

  /// Record the provider detected for the signed-in user.
  pub fn set_detected(&mut self, provider: Option<Provider>) {
    if let Some(p) = &provider {
      self.names.insert(p.id, p.name.clone());
    }
    self.selected = provider.map(|p| p.id);
  }

  /// User choice in editable mode.
  pub fn select(&mut self, id: Option<ItemId>) -> Result<()> {
    if self.locked {
      return Err(FormError::validation("La empresa no se puede cambiar."));
    }
    self.selected = id;
    Ok(())
  }

  /// Show the provider of a record loaded from the grid. A detected provider
  /// in locked mode is left alone.
  pub fn reflect_from_record(&mut self, provider_ids: &[ItemId]) {
    if !self.locked
      && let Some(&id) = provider_ids.first()
    {
      self.selected = Some(id);
    }
  }

  /// Field used to filter people by the current provider, if one is known.
  pub fn filter(&self) -> Option<(String, ItemId)> {
    let id = self.selected?;
    let shape = self.shape.clone().unwrap_or_default();
    Some((shape.filter_field(), id))
  }

  /// The relationship part of a person write.
  ///
  /// Locked mode writes nothing when no provider was detected or the column
  /// shape is unknown. Editable mode requires a selection.
  pub fn payload(&self) -> Result<Fields> {
    match (self.locked, self.selected, &self.shape) {
      (true, Some(id), Some(shape)) => {
        Ok(relationship_payload(shape, &ProviderRef::for_shape(shape, id)))
      }
      (true, ..) => Ok(Fields::new()),
      (false, None, _) => Err(FormError::validation("Empresa es obligatoria.")),
      (false, Some(id), shape) => {
        let shape = shape.clone().unwrap_or_default();
        Ok(relationship_payload(&shape, &ProviderRef::for_shape(&shape, id)))
      }
    }
  }
}
