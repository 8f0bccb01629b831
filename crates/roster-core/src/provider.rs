//! Provider organisations — read-only from the registry's point of view.

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  item::{Item, ItemId},
  schema::{ID, TITLE},
};

/// A provider as listed in the provider catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
  pub id:   ItemId,
  pub name: String,
}

impl Provider {
  pub const SELECT: &'static [&'static str] = &[ID, TITLE];

  pub fn from_item(item: &Item) -> Result<Self> {
    Ok(Self { id: item.id, name: item.text(TITLE).unwrap_or_default().to_owned() })
  }
}
