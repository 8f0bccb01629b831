//! User edits to the person section of the form.

use roster_core::person::{DocumentType, JobRole, LicenseCategory, PersonDraft};
use serde::{Deserialize, Serialize};

use crate::{FormError, error::Result};

/// A single field change, as sent by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FormEdit {
  DocumentNumber(String),
  GivenName(String),
  PaternalSurname(String),
  MaternalSurname(String),
  DocumentType(Option<DocumentType>),
  Role(Option<JobRole>),
  RoleOther(String),
  LicenseNumber(String),
  LicenseCategory(Option<LicenseCategory>),
  NotificationEmails(String),
}

impl FormEdit {
  /// Edits to the work-data section, which stays read-only until the
  /// document number is long enough.
  pub fn is_work_data(&self) -> bool {
    matches!(
      self,
      Self::Role(_) | Self::RoleOther(_) | Self::LicenseNumber(_) | Self::LicenseCategory(_)
    )
  }

  /// Apply to `draft`, refusing edits to fields hidden for the current role.
  pub fn apply_to(self, draft: &mut PersonDraft) -> Result<()> {
    match self {
      Self::DocumentNumber(v) => draft.document_number = v,
      Self::GivenName(v) => draft.given_name = v,
      Self::PaternalSurname(v) => draft.paternal_surname = v,
      Self::MaternalSurname(v) => draft.maternal_surname = v,
      Self::DocumentType(v) => draft.document_type = v,
      Self::Role(v) => draft.set_role(v),
      Self::NotificationEmails(v) => draft.notification_emails = v,
      Self::RoleOther(v) => {
        if draft.role != Some(JobRole::Other) {
          return Err(hidden());
        }
        draft.role_other = v;
      }
      Self::LicenseNumber(v) => {
        if !draft.is_driver() {
          return Err(hidden());
        }
        draft.license_number = v;
      }
      Self::LicenseCategory(v) => {
        if !draft.is_driver() {
          return Err(hidden());
        }
        draft.license_category = v;
      }
    }
    Ok(())
  }
}

fn hidden() -> FormError { FormError::validation("El campo no aplica al puesto seleccionado.") }
