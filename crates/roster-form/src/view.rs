//! Serializable snapshot of everything a host needs to render the form.

use chrono::NaiveDate;
use roster_core::{
  document::{AttachmentLink, DateKind, DocumentLabel},
  item::ItemId,
  person::{Person, PersonDraft},
  provider::Provider,
};
use serde::Serialize;

use crate::Mode;

#[derive(Debug, Clone, Serialize)]
pub struct FormView {
  pub mode:             Mode,
  pub draft:            PersonDraft,
  /// Every input is read-only (deactivation, or a save in flight).
  pub read_only:        bool,
  pub work_data_locked: bool,
  pub show_role_other:  bool,
  pub show_license:     bool,
  pub provider:         ProviderView,
  pub documents:        Vec<DocumentRowView>,
  /// Present in modify and deactivate modes.
  pub grid:             Option<GridView>,
  pub can_save:         bool,
  pub saving:           bool,
  /// Open deactivation dialog and the reason typed so far.
  pub deactivation:     Option<String>,
  /// Inline date-policy problem, if any.
  pub policy_error:     Option<String>,
  pub error:            Option<String>,
  pub success:          Option<String>,
  /// Documentation rows skipped during the last save.
  pub warnings:         Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderView {
  pub locked:   bool,
  pub selected: Option<ItemId>,
  pub name:     Option<String>,
  pub options:  Vec<Provider>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentRowView {
  pub label:        DocumentLabel,
  pub date_kind:    DateKind,
  pub date:         Option<NaiveDate>,
  pub accepts_file: bool,
  pub required:     bool,
  /// Name of the file waiting to be uploaded.
  pub pending_file: Option<String>,
  pub attachments:  Vec<AttachmentLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridView {
  pub search:   String,
  pub rows:     Vec<GridRow>,
  pub selected: Option<ItemId>,
  /// Shown instead of rows when there are none to show.
  pub empty:    Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridRow {
  pub id:              ItemId,
  pub document_number: String,
  pub full_name:       String,
  pub document_type:   Option<String>,
  pub role:            Option<String>,
}

impl From<&Person> for GridRow {
  fn from(p: &Person) -> Self {
    let d = &p.draft;
    let full_name = [d.given_name.as_str(), d.paternal_surname.as_str(), d.maternal_surname.as_str()]
      .into_iter()
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>()
      .join(" ");
    Self {
      id: p.id,
      document_number: d.document_number.clone(),
      full_name,
      document_type: d.document_type.map(|t| t.to_string()),
      role: d.role.map(|r| r.to_string()),
    }
  }
}
