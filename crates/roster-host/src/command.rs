//! Newline-delimited JSON commands and their replies.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::NaiveDate;
use roster_core::{
  document::DocumentLabel,
  item::{ItemId, PendingFile},
  store::Identity,
};
use roster_form::{FormController, FormEdit, FormError, FormView, Mode, SaveOutcome, translate};
use serde::{Deserialize, Serialize};

/// One user interaction, as the hosting page would report it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
  Mode { mode: Mode },
  Edit { edit: FormEdit },
  DocumentDate { label: DocumentLabel, date: Option<NaiveDate> },
  /// Attach the file at `path`, or clear the pending file.
  DocumentFile { label: DocumentLabel, path: Option<PathBuf> },
  Provider { id: Option<ItemId> },
  Search { text: String },
  Select { id: ItemId },
  Save,
  Reason { text: String },
  Confirm,
  CancelDeactivation,
  Cancel,
  View,
}

#[derive(Debug, Serialize)]
pub struct Reply {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub outcome:  Option<SaveOutcome>,
  /// Why the command itself was refused.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rejected: Option<String>,
  pub view:     FormView,
}

impl Reply {
  pub fn rejected(reason: impl Into<String>, view: FormView) -> Self {
    Self { outcome: None, rejected: Some(reason.into()), view }
  }
}

async fn read_file(path: &Path) -> anyhow::Result<PendingFile> {
  let content = tokio::fs::read(path).await.with_context(|| format!("failed to read {path:?}"))?;
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .context("path has no file name")?;
  Ok(PendingFile::new(name, content))
}

/// Run `cmd` against `form` and describe the result.
pub async fn run<S: Identity>(form: &mut FormController<S>, cmd: Command) -> Reply {
  let mut outcome = None;
  let result: Result<(), FormError> = match cmd {
    Command::Mode { mode } => {
      form.set_mode(mode).await;
      Ok(())
    }
    Command::Edit { edit } => form.apply(edit).await,
    Command::DocumentDate { label, date } => form.set_document_date(label, date),
    Command::DocumentFile { label, path: None } => form.set_document_file(label, None),
    Command::DocumentFile { label, path: Some(path) } => match read_file(&path).await {
      Ok(file) => form.set_document_file(label, Some(file)),
      Err(e) => return Reply::rejected(format!("{e:#}"), form.view()),
    },
    Command::Provider { id } => form.select_provider(id).await,
    Command::Search { text } => {
      form.set_search(text);
      Ok(())
    }
    Command::Select { id } => form.select_row(id).await,
    Command::Save => {
      outcome = Some(form.save().await);
      Ok(())
    }
    Command::Reason { text } => form.set_deactivation_reason(text),
    Command::Confirm => {
      outcome = Some(form.confirm_deactivation().await);
      Ok(())
    }
    Command::CancelDeactivation => {
      form.cancel_deactivation();
      Ok(())
    }
    Command::Cancel => {
      form.cancel();
      Ok(())
    }
    Command::View => Ok(()),
  };

  let rejected = result.err().map(|e| {
    tracing::debug!(%e, "command rejected");
    translate::describe(&e, Some(form.draft().document_number.trim()))
  });
  Reply { outcome, rejected, view: form.view() }
}
