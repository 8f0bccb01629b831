//! Person records — one registered individual tied to a provider.
//!
//! The document number is the business key. It is also the title of the
//! person's list item and the value documentation rows point back to.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
  Result,
  item::{Fields, Item, ItemId},
  schema::person as col,
};

// ─── Catalogs ────────────────────────────────────────────────────────────────

/// Kind of identity document the document number belongs to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr, Serialize,
  Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum DocumentType {
  #[strum(serialize = "DNI")]
  #[serde(rename = "DNI")]
  NationalId,
  #[strum(serialize = "Pasaporte")]
  #[serde(rename = "Pasaporte")]
  Passport,
  #[strum(serialize = "Carnet")]
  #[serde(rename = "Carnet")]
  ResidencyCard,
}

impl DocumentType {
  /// Length the document number must reach before work data may be edited.
  pub fn min_number_length(self) -> usize {
    match self {
      Self::NationalId => 8,
      Self::Passport | Self::ResidencyCard => 9,
    }
  }
}

/// Job role of the person within the provider.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr, Serialize,
  Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum JobRole {
  #[strum(serialize = "Conductor")]
  #[serde(rename = "Conductor")]
  Driver,
  #[strum(serialize = "Auxiliar de carga")]
  #[serde(rename = "Auxiliar de carga")]
  Loader,
  #[strum(serialize = "Coordinador de operación")]
  #[serde(rename = "Coordinador de operación")]
  Coordinator,
  #[strum(serialize = "Otro")]
  #[serde(rename = "Otro")]
  Other,
}

/// Driving license category; only meaningful for drivers.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr, Serialize,
  Deserialize,
)]
pub enum LicenseCategory {
  A,
  B,
  C,
}

/// Parse a catalog value read from the store, ignoring surrounding spaces.
/// Unknown or blank values read as unset.
fn parse_choice<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
  raw.map(str::trim).filter(|s| !s.is_empty()).and_then(|s| s.parse().ok())
}

// ─── Text helpers ────────────────────────────────────────────────────────────

static HTML_TAG: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static pattern"));

/// Drop markup tags from a rich-text value and trim it.
pub fn strip_html(html: &str) -> String { HTML_TAG.replace_all(html, "").trim().to_owned() }

/// `true` while the document number is too short for its type, or no type has
/// been chosen. Work data (role, license) stays read-only until then.
pub fn work_data_locked(document_type: Option<DocumentType>, document_number: &str) -> bool {
  match document_type {
    None => true,
    Some(t) => document_number.trim().chars().count() < t.min_number_length(),
  }
}

// ─── PersonDraft ─────────────────────────────────────────────────────────────

/// The editable attributes of a person, as held by the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDraft {
  pub document_number:     String,
  pub given_name:          String,
  pub paternal_surname:    String,
  pub maternal_surname:    String,
  pub document_type:       Option<DocumentType>,
  pub role:                Option<JobRole>,
  /// Free text describing the role when `role` is [`JobRole::Other`].
  pub role_other:          String,
  pub license_number:      String,
  pub license_category:    Option<LicenseCategory>,
  pub notification_emails: String,
}

impl PersonDraft {
  /// Change the role, clearing the fields that only apply to the old one.
  pub fn set_role(&mut self, role: Option<JobRole>) {
    if role != Some(JobRole::Other) {
      self.role_other.clear();
    }
    if role != Some(JobRole::Driver) {
      self.license_number.clear();
      self.license_category = None;
    }
    self.role = role;
  }

  pub fn is_driver(&self) -> bool { self.role == Some(JobRole::Driver) }

  pub fn work_data_locked(&self) -> bool {
    work_data_locked(self.document_type, &self.document_number)
  }

  /// Fields written on every create or update. The document number is only
  /// sent on create; see [`PersonDraft::to_create_fields`].
  pub fn to_update_fields(&self) -> Fields {
    let choice = |v: Option<&str>| v.map_or(Value::Null, |s| json!(s));
    let mut f = Fields::new();
    f.insert(col::GIVEN_NAME.into(), json!(self.given_name));
    f.insert(col::PATERNAL_SURNAME.into(), json!(self.paternal_surname));
    f.insert(col::MATERNAL_SURNAME.into(), json!(self.maternal_surname));
    f.insert(col::DOCUMENT_TYPE.into(), choice(self.document_type.as_ref().map(AsRef::as_ref)));
    f.insert(col::ROLE.into(), choice(self.role.as_ref().map(AsRef::as_ref)));
    f.insert(col::ROLE_OTHER.into(), json!(self.role_other));
    f.insert(col::LICENSE_NUMBER.into(), json!(self.license_number));
    f.insert(
      col::LICENSE_CATEGORY.into(),
      choice(self.license_category.as_ref().map(AsRef::as_ref)),
    );
    f.insert(col::NOTIFICATION_EMAILS.into(), json!(strip_html(&self.notification_emails)));
    f
  }

  /// Fields for a brand-new person item: everything plus the key, active.
  pub fn to_create_fields(&self) -> Fields {
    let mut f = self.to_update_fields();
    f.insert(col::DOCUMENT_NUMBER.into(), json!(self.document_number));
    f.insert(col::ACTIVE.into(), json!(true));
    f
  }
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// A person item read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:                  ItemId,
  pub draft:               PersonDraft,
  /// Provider ids held by the relationship column (one, unless multi-valued).
  pub provider_ids:        Vec<ItemId>,
  pub active:              bool,
  pub deactivation_reason: Option<String>,
}

impl Person {
  /// Columns needed to populate the grid and the form.
  pub const SELECT: &'static [&'static str] = &[
    crate::schema::ID,
    col::DOCUMENT_NUMBER,
    col::GIVEN_NAME,
    col::PATERNAL_SURNAME,
    col::MATERNAL_SURNAME,
    col::DOCUMENT_TYPE,
    col::ROLE,
    col::ROLE_OTHER,
    col::LICENSE_NUMBER,
    col::LICENSE_CATEGORY,
    col::PROVIDER_ID,
    col::NOTIFICATION_EMAILS,
    col::ACTIVE,
    col::DEACTIVATION_REASON,
  ];

  pub fn from_item(item: &Item) -> Result<Self> {
    let text = |field: &str| item.text(field).unwrap_or_default().to_owned();
    let draft = PersonDraft {
      document_number:     item.required_text(col::DOCUMENT_NUMBER)?.to_owned(),
      given_name:          text(col::GIVEN_NAME),
      paternal_surname:    text(col::PATERNAL_SURNAME),
      maternal_surname:    text(col::MATERNAL_SURNAME),
      document_type:       parse_choice(item.text(col::DOCUMENT_TYPE)),
      role:                parse_choice(item.text(col::ROLE)),
      role_other:          text(col::ROLE_OTHER),
      license_number:      text(col::LICENSE_NUMBER),
      license_category:    parse_choice(item.text(col::LICENSE_CATEGORY)),
      notification_emails: strip_html(item.text(col::NOTIFICATION_EMAILS).unwrap_or_default()),
    };

    Ok(Self {
      id: item.id,
      draft,
      provider_ids: item.lookup_ids(col::PROVIDER_ID),
      // Items created outside this component may not carry the flag at all.
      active: item.flag(col::ACTIVE).unwrap_or(true),
      deactivation_reason: item
        .text(col::DEACTIVATION_REASON)
        .filter(|s| !s.is_empty())
        .map(str::to_owned),
    })
  }

  /// Lower-cased text the grid search matches against.
  pub fn search_text(&self) -> String {
    let d = &self.draft;
    [
      d.document_number.as_str(),
      d.given_name.as_str(),
      d.paternal_surname.as_str(),
      d.maternal_surname.as_str(),
      d.role.as_ref().map_or("", AsRef::as_ref),
      d.license_category.as_ref().map_or("", AsRef::as_ref),
      d.document_type.as_ref().map_or("", AsRef::as_ref),
      d.role_other.as_str(),
      d.license_number.as_str(),
    ]
    .join(" ")
    .to_lowercase()
  }
}
