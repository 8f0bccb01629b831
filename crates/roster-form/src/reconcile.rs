//! Keeping documentation rows in step with the form.
//!
//! Each (person key, label) pair maps to at most one canonical record: the
//! newest match. Writes update that record in place or create it lazily, and
//! an uploaded file replaces whatever was attached before.

use roster_core::{
  document::{AttachmentLink, DocDate, DocumentLabel, DocumentationRecord},
  item::{ItemId, PendingFile},
  query::{Filter, ListQuery, Order},
  schema::{DOCUMENTS_LIST, ID, document as col},
  store::ListStore,
};

use crate::{BestEffort, FormError, documents::Documents, error::Result};

/// What [`DocumentReconciler::upsert`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertReport {
  pub id:      ItemId,
  pub created: bool,
  /// One entry per previous attachment removal, present when a file was
  /// supplied. `Ok` holds the removed file name.
  pub cleanup: Vec<BestEffort<String>>,
}

pub struct DocumentReconciler<'a, S> {
  store: &'a S,
}

impl<'a, S: ListStore> DocumentReconciler<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// The newest record for (`person_key`, `label`).
  pub async fn find(&self, person_key: &str, label: DocumentLabel) -> Result<Option<ItemId>> {
    let q = ListQuery::new()
      .select([ID])
      .filter(Filter::eq(col::PERSON_KEY, person_key).and(Filter::eq(col::LABEL, label.to_string())))
      .order_by(ID, Order::Descending)
      .top(1);
    let items = self.store.query(DOCUMENTS_LIST, &q).await.map_err(FormError::remote)?;
    Ok(items.first().map(|it| it.id))
  }

  /// Write `date` to the (`person_key`, `label`) record, creating it if
  /// needed, and replace its attachments with `file` when one is given.
  pub async fn upsert(
    &self,
    person_key: &str,
    label: DocumentLabel,
    date: DocDate,
    file: Option<&PendingFile>,
  ) -> Result<UpsertReport> {
    let person_key = person_key.trim();
    if person_key.is_empty() {
      return Err(FormError::validation("Documento (Title) es obligatorio para Documentación."));
    }

    let (id, created) = match self.find(person_key, label).await? {
      Some(id) => {
        self
          .store
          .update_item(DOCUMENTS_LIST, id, date.to_fields())
          .await
          .map_err(FormError::remote)?;
        (id, false)
      }
      None => {
        let fields = DocumentationRecord::new_fields(person_key, label, date);
        let outcome =
          self.store.add_item(DOCUMENTS_LIST, fields).await.map_err(FormError::remote)?;
        let id = match outcome.id {
          Some(id) => id,
          None => self.find(person_key, label).await?.ok_or_else(|| {
            FormError::integrity("No se pudo obtener el Id del item de Documentación.")
          })?,
        };
        (id, true)
      }
    };
    tracing::debug!(person_key, %label, id, created, "documentation upserted");

    let cleanup = match file {
      Some(file) => self.replace_attachments(id, file).await?,
      None => Vec::new(),
    };
    Ok(UpsertReport { id, created, cleanup })
  }

  /// Remove every attachment of `id`, then attach `file`.
  ///
  /// Listing and removal are best-effort; only the upload itself can fail.
  pub async fn replace_attachments(
    &self,
    id: ItemId,
    file: &PendingFile,
  ) -> Result<Vec<BestEffort<String>>> {
    let existing = BestEffort::absorb(
      "listing attachments",
      self.store.list_attachments(DOCUMENTS_LIST, id).await,
    );

    let mut cleanup = Vec::new();
    match existing {
      BestEffort::Ok(existing) => {
        for info in existing {
          let removed = self.store.delete_attachment(DOCUMENTS_LIST, id, &info.file_name).await;
          cleanup.push(BestEffort::absorb(
            "removing attachment",
            removed.map(|()| info.file_name),
          ));
        }
      }
      BestEffort::Ignored(reason) => cleanup.push(BestEffort::Ignored(reason)),
    }

    self
      .store
      .add_attachment(DOCUMENTS_LIST, id, &file.name, file.content.clone())
      .await
      .map_err(FormError::remote)?;
    Ok(cleanup)
  }

  /// Every row for `person_key`, with dates and attachment links filled in.
  ///
  /// A row whose attachments cannot be listed is shown without them.
  pub async fn load(&self, person_key: &str, site_base_url: &str) -> Result<Documents> {
    let mut docs = Documents::default();
    let person_key = person_key.trim();
    if person_key.is_empty() {
      return Ok(docs);
    }

    let q = ListQuery::new()
      .select(DocumentationRecord::SELECT.iter().copied())
      .filter(Filter::eq(col::PERSON_KEY, person_key))
      .order_by(ID, Order::Ascending);
    let items = self.store.query(DOCUMENTS_LIST, &q).await.map_err(FormError::remote)?;

    // Ascending order: a later match overwrites an earlier one.
    let mut canonical = Vec::<DocumentationRecord>::new();
    for item in &items {
      match DocumentationRecord::from_item(item) {
        Ok(rec) => {
          canonical.retain(|r| r.label != rec.label);
          canonical.push(rec);
        }
        Err(e) => tracing::debug!(id = item.id, %e, "skipping documentation item"),
      }
    }

    for rec in canonical {
      let row = docs.get_mut(rec.label);
      row.date = rec.date();
      row.attachments = BestEffort::absorb(
        "loading attachments",
        self.store.list_attachments(DOCUMENTS_LIST, rec.id).await,
      )
      .ok()
      .unwrap_or_default()
      .iter()
      .map(|info| AttachmentLink::resolve(site_base_url, info))
      .collect();
    }
    Ok(docs)
  }

  /// Delete every record for `person_key`. Returns how many were removed.
  pub async fn delete_all(&self, person_key: &str) -> Result<usize> {
    let q = ListQuery::new().select([ID]).filter(Filter::eq(col::PERSON_KEY, person_key.trim()));
    let items = self.store.query(DOCUMENTS_LIST, &q).await.map_err(FormError::remote)?;
    for item in &items {
      self.store.delete_item(DOCUMENTS_LIST, item.id).await.map_err(FormError::remote)?;
    }
    Ok(items.len())
  }
}
