//! The five documentation rows shown on the form.

use chrono::NaiveDate;
use roster_core::{
  date_policy::{self, cutoff_date, format_date},
  document::{AttachmentLink, DocumentLabel},
  item::PendingFile,
};

/// One row of the documentation section: the single date the label uses,
/// the attachments already stored, and a file waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
  pub label:       DocumentLabel,
  pub date:        Option<NaiveDate>,
  pub attachments: Vec<AttachmentLink>,
  pub file:        Option<PendingFile>,
}

impl DocumentRow {
  pub fn new(label: DocumentLabel) -> Self {
    Self { label, date: None, attachments: Vec::new(), file: None }
  }

  /// A file is either chosen for upload or already stored.
  pub fn has_file(&self) -> bool { self.file.is_some() || !self.attachments.is_empty() }

  /// The issuance-age message for this row, if its date breaks the rule.
  pub fn policy_violation(&self, today: NaiveDate) -> Option<String> {
    let months = self.label.max_age_months()?;
    if date_policy::is_not_older_than(self.date, months, today) {
      return None;
    }
    Some(format!(
      "La fecha de emisión {} no puede ser anterior a {}.",
      self.label.with_preposition(),
      format_date(cutoff_date(months, today)),
    ))
  }
}

/// All rows, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Documents {
  rows: Vec<DocumentRow>,
}

impl Default for Documents {
  fn default() -> Self { Self { rows: DocumentLabel::all().map(DocumentRow::new).collect() } }
}

impl Documents {
  pub fn iter(&self) -> impl Iterator<Item = &DocumentRow> { self.rows.iter() }

  pub fn get(&self, label: DocumentLabel) -> &DocumentRow {
    // Every label has a row from construction onwards.
    let idx = self.rows.iter().position(|r| r.label == label).unwrap_or_default();
    &self.rows[idx]
  }

  pub fn get_mut(&mut self, label: DocumentLabel) -> &mut DocumentRow {
    let idx = self.rows.iter().position(|r| r.label == label).unwrap_or_default();
    &mut self.rows[idx]
  }

  /// Whether `label` must be filled before a new person can be saved.
  ///
  /// Certificates need a date and a file; the ID needs its date; the license
  /// only matters for drivers.
  pub fn is_required(label: DocumentLabel, is_driver: bool) -> bool {
    match label {
      DocumentLabel::License => is_driver,
      _ => true,
    }
  }

  pub fn mandatory_present(&self, is_driver: bool) -> bool {
    self.rows.iter().filter(|r| Self::is_required(r.label, is_driver)).all(|r| {
      r.date.is_some() && (!r.label.accepts_file() || r.has_file())
    })
  }

  /// The first date-policy violation, in catalog order.
  pub fn policy_violation(&self, today: NaiveDate) -> Option<String> {
    self.rows.iter().find_map(|r| r.policy_violation(today))
  }
}
