//! Documentation records — one item per (person, document label) pair.
//!
//! The label catalog is fixed. Identity documents carry an expiry date;
//! certificates carry an issuance date and an attached file. A record never
//! holds both dates.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::{
  Error, Result,
  date_policy::{BACKGROUND_CERTIFICATE_MONTHS, HEALTH_CERTIFICATE_MONTHS},
  item::{AttachmentInfo, Fields, Item, ItemId},
  schema::document as col,
};

// ─── Labels ──────────────────────────────────────────────────────────────────

/// The fixed catalog of documents kept for every person.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr, Serialize,
  Deserialize,
)]
pub enum DocumentLabel {
  #[strum(serialize = "DNI")]
  #[serde(rename = "DNI")]
  Id,
  #[strum(serialize = "Licencia")]
  #[serde(rename = "Licencia")]
  License,
  #[strum(serialize = "Carnet de sanidad")]
  #[serde(rename = "Carnet de sanidad")]
  HealthCertificate,
  #[strum(serialize = "Antecedentes penales")]
  #[serde(rename = "Antecedentes penales")]
  CriminalBackground,
  #[strum(serialize = "Antecedentes policiales")]
  #[serde(rename = "Antecedentes policiales")]
  PoliceBackground,
}

/// Which date column a label uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateKind {
  Expiry,
  Issued,
}

impl DocumentLabel {
  /// Catalog order, as shown on the form.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }

  pub fn date_kind(self) -> DateKind {
    match self {
      Self::Id | Self::License => DateKind::Expiry,
      _ => DateKind::Issued,
    }
  }

  /// Identity documents only record a date; certificates take a file.
  pub fn accepts_file(self) -> bool { self.date_kind() == DateKind::Issued }

  /// How old an issuance date may be, for labels with an age rule.
  pub fn max_age_months(self) -> Option<u32> {
    match self {
      Self::HealthCertificate => Some(HEALTH_CERTIFICATE_MONTHS),
      Self::CriminalBackground | Self::PoliceBackground => Some(BACKGROUND_CERTIFICATE_MONTHS),
      Self::Id | Self::License => None,
    }
  }

  /// The label with its Spanish contraction, for messages
  /// (`del "Carnet de sanidad"`, `de "Antecedentes penales"`).
  pub fn with_preposition(self) -> String {
    match self {
      Self::HealthCertificate => format!("del \"{self}\""),
      _ => format!("de \"{self}\""),
    }
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

/// The single date a documentation write touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "date", rename_all = "snake_case")]
pub enum DocDate {
  Expiry(Option<NaiveDate>),
  Issued(Option<NaiveDate>),
}

impl DocDate {
  /// The date column matching `label`, holding `date`.
  pub fn for_label(label: DocumentLabel, date: Option<NaiveDate>) -> Self {
    match label.date_kind() {
      DateKind::Expiry => Self::Expiry(date),
      DateKind::Issued => Self::Issued(date),
    }
  }

  /// The one-column field map for this date.
  pub fn to_fields(self) -> Fields {
    let (column, date) = match self {
      Self::Expiry(d) => (col::EXPIRY, d),
      Self::Issued(d) => (col::ISSUED, d),
    };
    let mut f = Fields::new();
    f.insert(column.into(), encode_date(date));
    f
  }
}

pub fn encode_date(date: Option<NaiveDate>) -> Value {
  date.map_or(Value::Null, |d| json!(d.format("%Y-%m-%d").to_string()))
}

/// Accepts plain dates and full RFC 3339 timestamps; anything else reads as
/// unset.
pub fn decode_date(raw: Option<&str>) -> Option<NaiveDate> {
  let raw = raw?.trim();
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A documentation item read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationRecord {
  pub id:         ItemId,
  /// Owning person's document number.
  pub person_key: String,
  pub label:      DocumentLabel,
  pub expiry:     Option<NaiveDate>,
  pub issued:     Option<NaiveDate>,
}

impl DocumentationRecord {
  pub const SELECT: &'static [&'static str] =
    &[crate::schema::ID, col::PERSON_KEY, col::LABEL, col::EXPIRY, col::ISSUED];

  pub fn from_item(item: &Item) -> Result<Self> {
    let raw_label = item.required_text(col::LABEL)?;
    let label = raw_label
      .parse()
      .map_err(|_| Error::UnknownDocumentLabel(raw_label.to_owned()))?;
    Ok(Self {
      id: item.id,
      person_key: item.required_text(col::PERSON_KEY)?.to_owned(),
      label,
      expiry: decode_date(item.text(col::EXPIRY)),
      issued: decode_date(item.text(col::ISSUED)),
    })
  }

  /// The date relevant to this record's label.
  pub fn date(&self) -> Option<NaiveDate> {
    match self.label.date_kind() {
      DateKind::Expiry => self.expiry,
      DateKind::Issued => self.issued,
    }
  }

  /// Field map for a brand-new record.
  pub fn new_fields(person_key: &str, label: DocumentLabel, date: DocDate) -> Fields {
    let mut f = date.to_fields();
    f.insert(col::PERSON_KEY.into(), json!(person_key));
    f.insert(col::LABEL.into(), json!(label.to_string()));
    f
  }
}

/// A link to an attachment, absolute against the site base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentLink {
  pub name: String,
  pub href: String,
}

impl AttachmentLink {
  pub fn resolve(site_base_url: &str, info: &AttachmentInfo) -> Self {
    Self {
      name: info.file_name.clone(),
      href: format!("{}{}", site_base_url.trim_end_matches('/'), info.server_relative_url),
    }
  }
}
