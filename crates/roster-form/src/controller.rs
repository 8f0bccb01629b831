//! The form's state machine: modes, edits, grid, and the save flows.
//!
//! [`FormController`] owns every piece of in-memory form state. Store calls
//! are made through a shared [`Identity`] handle; the controller never caches
//! durable state beyond what it is currently showing.
//!
//! Grid and documentation loads come in three steps (`begin_*`, `fetch_*`,
//! `commit_*`) so a host can run them concurrently with other work. A commit
//! whose ticket was superseded by a newer `begin_*` is dropped.

use std::sync::Arc;

use chrono::NaiveDate;
use roster_core::{
  date_policy,
  document::{DocDate, DocumentLabel},
  item::{Fields, ItemId, PendingFile},
  person::{JobRole, Person, PersonDraft},
  query::{Filter, ListQuery, Order},
  schema::{ID, PERSONS_LIST, TITLE, person as col},
  store::{Identity, ListStore},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
  BestEffort, FormEdit, FormError, FormView, HostConfig,
  documents::Documents,
  error::Result,
  load::{LoadTicket, Loads},
  provider::{self, ProviderResolver},
  reconcile::DocumentReconciler,
  translate::describe,
  view::{DocumentRowView, GridRow, GridView, ProviderView},
};

/// Upper bound on people loaded into the grid.
pub const GRID_LIMIT: usize = 5000;

const CREATED: &str = "Ingresado en Personas y Documentación.";
const MODIFIED: &str = "Registro modificado. Documentación actualizada sin borrar adjuntos.";
const DELETED: &str = "Registro eliminado de Personas y toda la Documentación.";
const DEACTIVATED: &str = "Registro marcado como inactivo.";
const REASON_REQUIRED: &str = "Ingresá el motivo de la baja.";
const NO_SUCH_PERSON: &str = "No existe persona con ese Documento.";

// ─── Modes and outcomes ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  #[default]
  Create,
  Modify,
  Deactivate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
  Saved,
  /// A precondition failed; nothing was written.
  Blocked,
  /// The deactivation dialog was opened and waits for a reason.
  AwaitingConfirmation,
  /// The store rejected part of the save. The error is on the view.
  Failed,
}

/// What [`FormController::mount`] managed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountReport {
  /// Whether the relationship column was found.
  pub shape:    BestEffort<bool>,
  /// Catalog size, editable mode only.
  pub options:  Option<BestEffort<usize>>,
  /// Detected provider, locked mode only.
  pub detected: Option<BestEffort<Option<ItemId>>>,
}

// ─── Load requests ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum GridScope {
  All,
  Provider { field: String, id: ItemId },
  /// Filtering by provider is on but none is known yet.
  AwaitingProvider,
}

/// A started grid load.
#[derive(Debug, Clone)]
pub struct GridRequest {
  ticket: LoadTicket,
  scope:  GridScope,
}

/// A started documentation load.
#[derive(Debug, Clone)]
pub struct DocumentsRequest {
  ticket:        LoadTicket,
  person_key:    String,
  site_base_url: String,
}

// ─── Controller ──────────────────────────────────────────────────────────────

pub struct FormController<S> {
  store:        Arc<S>,
  config:       HostConfig,
  today:        NaiveDate,
  mode:         Mode,
  draft:        PersonDraft,
  documents:    Documents,
  provider:     ProviderResolver,
  grid:         Vec<Person>,
  grid_loaded:  bool,
  search:       String,
  selected:     Option<ItemId>,
  deactivation: Option<String>,
  saving:       bool,
  error:        Option<String>,
  success:      Option<String>,
  warnings:     Vec<String>,
  loads:        Loads,
}

impl<S: Identity> FormController<S> {
  pub fn new(store: Arc<S>, config: HostConfig) -> Self {
    let provider = ProviderResolver::new(config.lock_provider);
    Self {
      store,
      config,
      today: date_policy::today(),
      mode: Mode::Create,
      draft: PersonDraft::default(),
      documents: Documents::default(),
      provider,
      grid: Vec::new(),
      grid_loaded: false,
      search: String::new(),
      selected: None,
      deactivation: None,
      saving: false,
      error: None,
      success: None,
      warnings: Vec::new(),
      loads: Loads::default(),
    }
  }

  /// Pin the date the age rules are evaluated against.
  pub fn with_today(mut self, today: NaiveDate) -> Self {
    self.today = today;
    self
  }

  pub fn mode(&self) -> Mode { self.mode }

  pub fn draft(&self) -> &PersonDraft { &self.draft }

  pub fn documents(&self) -> &Documents { &self.documents }

  pub fn provider(&self) -> &ProviderResolver { &self.provider }

  pub fn selected(&self) -> Option<ItemId> { self.selected }

  pub fn error(&self) -> Option<&str> { self.error.as_deref() }

  pub fn success(&self) -> Option<&str> { self.success.as_deref() }

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Load provider metadata and either the catalog or the detected provider.
  /// Failures leave the form usable.
  pub async fn mount(&mut self) -> MountReport {
    let store = Arc::clone(&self.store);

    let shape = BestEffort::absorb("loading relationship metadata", provider::fetch_shape(&*store).await);
    if let BestEffort::Ok(s) = &shape {
      self.provider.set_shape(s.clone());
    }

    let (options, detected) = if self.config.lock_provider {
      let found = BestEffort::absorb("detecting provider", provider::detect_for_user(&*store).await);
      if let BestEffort::Ok(p) = &found {
        self.provider.set_detected(p.clone());
      }
      (None, Some(found.map(|p| p.map(|p| p.id))))
    } else {
      let options = BestEffort::absorb("loading providers", provider::fetch_options(&*store).await);
      let count = options.map(|opts| {
        let n = opts.len();
        self.provider.set_options(opts);
        n
      });
      (Some(count), None)
    };

    tracing::debug!(locked = self.config.lock_provider, provider = ?self.provider.selected(), "form mounted");
    MountReport { shape: shape.map(|s| s.is_some()), options, detected }
  }

  /// Retire every in-flight load.
  pub fn unmount(&mut self) { self.loads.cancel_all(); }

  /// Switch mode. Only a switch into create discards unsaved input; modify
  /// and deactivate keep the loaded person and reload the grid.
  pub async fn set_mode(&mut self, mode: Mode) {
    self.mode = mode;
    self.touch();
    self.deactivation = None;

    if mode == Mode::Create {
      self.reset_form();
      self.success = None;
      self.warnings.clear();
      self.grid.clear();
      self.grid_loaded = false;
      self.search.clear();
      self.loads.grid.cancel();
      return;
    }

    if let Err(e) = self.reload_grid().await {
      self.fail(&e);
    }
  }

  /// Clear the form, its documentation rows, the dialog and the selection.
  pub fn cancel(&mut self) {
    self.reset_form();
    self.error = None;
    self.success = None;
    self.warnings.clear();
  }

  // ── Edits ─────────────────────────────────────────────────────────────

  /// Apply a field edit. In modify mode a new document number reloads the
  /// documentation rows.
  pub async fn apply(&mut self, edit: FormEdit) -> Result<()> {
    self.ensure_editable()?;
    if edit.is_work_data() && self.draft.work_data_locked() {
      return Err(FormError::validation(
        "Completá tipo y número de documento antes de los datos laborales.",
      ));
    }

    let key_changed = matches!(&edit, FormEdit::DocumentNumber(v) if *v != self.draft.document_number);
    edit.apply_to(&mut self.draft)?;
    self.touch();

    if key_changed && self.mode == Mode::Modify {
      let reloaded = BestEffort::absorb("reloading documentation", self.reload_documents().await);
      if reloaded.is_ignored() {
        self.documents = Documents::default();
      }
    }
    Ok(())
  }

  pub fn set_document_date(&mut self, label: DocumentLabel, date: Option<NaiveDate>) -> Result<()> {
    self.ensure_editable()?;
    self.documents.get_mut(label).date = date;
    self.touch();
    Ok(())
  }

  /// Choose (or clear) the file uploaded for `label` on the next save.
  pub fn set_document_file(&mut self, label: DocumentLabel, file: Option<PendingFile>) -> Result<()> {
    self.ensure_editable()?;
    if !label.accepts_file() {
      return Err(FormError::validation(format!("{label} no admite archivos adjuntos.")));
    }
    self.documents.get_mut(label).file = file;
    self.touch();
    Ok(())
  }

  /// Choose the provider in editable mode.
  pub async fn select_provider(&mut self, id: Option<ItemId>) -> Result<()> {
    self.provider.select(id)?;
    self.touch();
    if self.mode != Mode::Create && self.config.filter_by_provider {
      self.reload_grid().await.inspect_err(|e| self.fail(e))?;
    }
    Ok(())
  }

  fn ensure_editable(&self) -> Result<()> {
    if self.saving {
      return Err(FormError::validation("Hay un guardado en curso."));
    }
    if self.mode == Mode::Deactivate {
      return Err(FormError::validation("El formulario es de solo lectura al dar de baja."));
    }
    Ok(())
  }

  /// Any user edit clears the pending error so the save action re-enables.
  fn touch(&mut self) { self.error = None; }

  fn fail(&mut self, e: &FormError) {
    let doc = self.draft.document_number.trim();
    self.error = Some(describe(e, Some(doc)));
  }

  fn reset_form(&mut self) {
    self.draft = PersonDraft::default();
    self.documents = Documents::default();
    self.selected = None;
    self.deactivation = None;
    self.loads.documents.cancel();
  }

  // ── Grid ──────────────────────────────────────────────────────────────

  pub fn set_search(&mut self, text: impl Into<String>) { self.search = text.into(); }

  /// Loaded rows matching the search text.
  pub fn visible_grid(&self) -> Vec<&Person> {
    let needle = self.search.trim().to_lowercase();
    self
      .grid
      .iter()
      .filter(|p| needle.is_empty() || p.search_text().contains(&needle))
      .collect()
  }

  pub fn begin_grid_load(&mut self) -> GridRequest {
    let scope = match (self.config.filter_by_provider, self.provider.filter()) {
      (false, _) => GridScope::All,
      (true, Some((field, id))) => GridScope::Provider { field, id },
      (true, None) => GridScope::AwaitingProvider,
    };
    GridRequest { ticket: self.loads.grid.begin(), scope }
  }

  /// Active people in scope, by document number.
  pub async fn fetch_grid(store: &S, req: &GridRequest) -> Result<Vec<Person>> {
    let mut filter = Filter::eq(col::ACTIVE, true);
    match &req.scope {
      GridScope::AwaitingProvider => return Ok(Vec::new()),
      GridScope::Provider { field, id } => filter = filter.and(Filter::eq(field.as_str(), *id)),
      GridScope::All => {}
    }

    let q = ListQuery::new()
      .select(Person::SELECT.iter().copied())
      .filter(filter)
      .order_by(ID, Order::Descending)
      .top(GRID_LIMIT);
    let items = store.query(PERSONS_LIST, &q).await.map_err(FormError::remote)?;

    let mut people: Vec<Person> = items
      .iter()
      .filter_map(|it| {
        Person::from_item(it)
          .inspect_err(|e| tracing::debug!(id = it.id, %e, "skipping person item"))
          .ok()
      })
      .collect();
    if let GridScope::Provider { id, .. } = &req.scope {
      people.retain(|p| p.provider_ids.contains(id));
    }
    Ok(people)
  }

  /// Install a finished grid load. Returns `false` when a newer load has
  /// started since, in which case `rows` is discarded.
  pub fn commit_grid(&mut self, req: GridRequest, rows: Result<Vec<Person>>) -> Result<bool> {
    if !self.loads.grid.is_current(req.ticket) {
      tracing::debug!("discarding superseded grid load");
      return Ok(false);
    }
    let rows = rows?;
    if self.selected.is_some_and(|id| !rows.iter().any(|p| p.id == id)) {
      self.selected = None;
    }
    self.grid = rows;
    self.grid_loaded = true;
    Ok(true)
  }

  pub async fn reload_grid(&mut self) -> Result<()> {
    let req = self.begin_grid_load();
    let rows = Self::fetch_grid(&self.store, &req).await;
    self.commit_grid(req, rows).map(|_| ())
  }

  /// Load a grid row into the form together with its documentation.
  pub async fn select_row(&mut self, id: ItemId) -> Result<()> {
    if self.mode == Mode::Create {
      return Err(FormError::validation("Elegí Modificar o Dar de baja para seleccionar un registro."));
    }
    let person = self
      .grid
      .iter()
      .find(|p| p.id == id)
      .cloned()
      .ok_or_else(|| FormError::integrity("El registro seleccionado ya no está disponible."))?;

    self.provider.reflect_from_record(&person.provider_ids);
    self.draft = person.draft;
    self.selected = Some(id);
    self.deactivation = None;
    self.touch();
    self.reload_documents().await.inspect_err(|e| self.fail(e))
  }

  // ── Documentation view ────────────────────────────────────────────────

  pub fn begin_documents_load(&mut self) -> DocumentsRequest {
    DocumentsRequest {
      ticket:        self.loads.documents.begin(),
      person_key:    self.draft.document_number.trim().to_owned(),
      site_base_url: self.config.site_base_url.clone(),
    }
  }

  pub async fn fetch_documents(store: &S, req: &DocumentsRequest) -> Result<Documents> {
    DocumentReconciler::new(store).load(&req.person_key, &req.site_base_url).await
  }

  pub fn commit_documents(&mut self, req: DocumentsRequest, docs: Result<Documents>) -> Result<bool> {
    if !self.loads.documents.is_current(req.ticket) {
      tracing::debug!("discarding superseded documentation load");
      return Ok(false);
    }
    self.documents = docs?;
    Ok(true)
  }

  pub async fn reload_documents(&mut self) -> Result<()> {
    let req = self.begin_documents_load();
    let docs = Self::fetch_documents(&self.store, &req).await;
    self.commit_documents(req, docs).map(|_| ())
  }

  // ── Save preconditions ────────────────────────────────────────────────

  /// The first age-rule violation among the documentation dates.
  pub fn date_policy_error(&self) -> Option<String> {
    match self.mode {
      Mode::Deactivate => None,
      Mode::Create | Mode::Modify => self.documents.policy_violation(self.today),
    }
  }

  pub fn mandatory_documents_present(&self) -> bool {
    self.documents.mandatory_present(self.draft.is_driver())
  }

  /// Why the current input cannot be saved, if it cannot.
  pub fn blocking_reason(&self) -> Option<String> {
    let d = &self.draft;
    if !self.provider.is_locked() && self.provider.selected().is_none() {
      return Some("Empresa es obligatoria.".into());
    }
    if d.document_number.trim().is_empty() {
      return Some("Documento es obligatorio.".into());
    }
    if self.mode == Mode::Deactivate {
      return None;
    }
    if d.given_name.trim().is_empty() {
      return Some("Nombre es obligatorio.".into());
    }
    if let Some(msg) = self.date_policy_error() {
      return Some(msg);
    }
    if self.mode == Mode::Create && !self.mandatory_documents_present() {
      return Some("Completá las fechas y archivos de la documentación obligatoria.".into());
    }
    None
  }

  pub fn can_save(&self) -> bool {
    !self.saving && self.error.is_none() && self.blocking_reason().is_none()
  }

  // ── Save ──────────────────────────────────────────────────────────────

  /// Run the save for the current mode. In deactivate mode the first call
  /// opens the reason dialog and a second call confirms it.
  pub async fn save(&mut self) -> SaveOutcome {
    if self.saving {
      return SaveOutcome::Blocked;
    }
    if self.mode == Mode::Deactivate && self.deactivation.is_some() {
      return self.confirm_deactivation().await;
    }
    if self.error.is_some() {
      return SaveOutcome::Blocked;
    }
    if let Some(reason) = self.blocking_reason() {
      self.error = Some(reason);
      return SaveOutcome::Blocked;
    }

    match self.mode {
      Mode::Deactivate => {
        self.deactivation = Some(String::new());
        SaveOutcome::AwaitingConfirmation
      }
      Mode::Create => {
        self.begin_save();
        let result = self.create().await;
        self.finish_save(result)
      }
      Mode::Modify => {
        self.begin_save();
        let result = self.modify().await;
        self.finish_save(result)
      }
    }
  }

  pub fn set_deactivation_reason(&mut self, reason: impl Into<String>) -> Result<()> {
    let Some(current) = self.deactivation.as_mut() else {
      return Err(FormError::validation("No hay una baja en curso."));
    };
    *current = reason.into();
    self.touch();
    Ok(())
  }

  /// Close the reason dialog without deactivating.
  pub fn cancel_deactivation(&mut self) {
    self.deactivation = None;
    self.touch();
  }

  /// Deactivate with the reason typed in the dialog. Without a reason the
  /// dialog stays open and nothing is written.
  pub async fn confirm_deactivation(&mut self) -> SaveOutcome {
    if self.saving {
      return SaveOutcome::Blocked;
    }
    let Some(dialog) = self.deactivation.as_deref() else {
      return SaveOutcome::Blocked;
    };
    let reason = dialog.trim().to_owned();
    if reason.is_empty() {
      self.error = Some(REASON_REQUIRED.into());
      return SaveOutcome::Blocked;
    }
    if let Some(msg) = self.blocking_reason() {
      self.error = Some(msg);
      return SaveOutcome::Blocked;
    }

    self.begin_save();
    let result = self.deactivate(&reason).await;
    self.finish_save(result)
  }

  fn begin_save(&mut self) {
    self.saving = true;
    self.error = None;
    self.success = None;
    self.warnings.clear();
  }

  fn finish_save(&mut self, result: Result<&'static str>) -> SaveOutcome {
    self.saving = false;
    match result {
      Ok(msg) => {
        tracing::info!(mode = ?self.mode, "{msg}");
        self.success = Some(msg.to_owned());
        SaveOutcome::Saved
      }
      Err(e) => {
        tracing::warn!(mode = ?self.mode, %e, "save failed");
        self.fail(&e);
        SaveOutcome::Failed
      }
    }
  }

  async fn find_person(&self, key: &str) -> Result<Option<ItemId>> {
    let q = ListQuery::new()
      .select([ID])
      .filter(Filter::eq(TITLE, key))
      .order_by(ID, Order::Descending)
      .top(1);
    let items = self.store.query(PERSONS_LIST, &q).await.map_err(FormError::remote)?;
    Ok(items.first().map(|it| it.id))
  }

  async fn create(&mut self) -> Result<&'static str> {
    let key = self.draft.document_number.trim().to_owned();
    let mut fields = self.draft.to_create_fields();
    fields.insert(col::DOCUMENT_NUMBER.into(), json!(key));
    fields.extend(self.provider.payload()?);

    let added = self.store.add_item(PERSONS_LIST, fields).await.map_err(FormError::remote)?;
    tracing::debug!(person_key = %key, id = ?added.id, "person added");

    let reconciler = DocumentReconciler::new(&*self.store);
    let is_driver = self.draft.is_driver();
    for row in self.documents.iter() {
      if row.label == DocumentLabel::License && !is_driver {
        continue;
      }
      let date = DocDate::for_label(row.label, row.date);
      reconciler.upsert(&key, row.label, date, row.file.as_ref()).await?;
    }

    self.reset_form();
    Ok(CREATED)
  }

  async fn modify(&mut self) -> Result<&'static str> {
    let key = self.draft.document_number.trim().to_owned();
    let id = self.find_person(&key).await?.ok_or_else(|| FormError::integrity(NO_SUCH_PERSON))?;

    let mut fields = self.draft.to_update_fields();
    fields.extend(self.provider.payload()?);
    self.store.update_item(PERSONS_LIST, id, fields).await.map_err(FormError::remote)?;

    // One bad row must not stop the others.
    let reconciler = DocumentReconciler::new(&*self.store);
    let mut warnings = Vec::new();
    for row in self.documents.iter() {
      let date = DocDate::for_label(row.label, row.date);
      let written = reconciler
        .upsert(&key, row.label, date, row.file.as_ref())
        .await
        .map_err(|e| describe(&e, Some(&key)));
      if let BestEffort::Ignored(reason) = BestEffort::absorb("documentation upsert", written) {
        warnings.push(format!("{}: {reason}", row.label));
      }
    }
    self.warnings = warnings;

    BestEffort::absorb("reloading documentation", self.reload_documents().await);
    BestEffort::absorb("reloading grid", self.reload_grid().await);
    Ok(MODIFIED)
  }

  async fn deactivate(&mut self, reason: &str) -> Result<&'static str> {
    let key = self.draft.document_number.trim().to_owned();
    let id = self.find_person(&key).await?.ok_or_else(|| FormError::integrity(NO_SUCH_PERSON))?;

    let mut fields = Fields::new();
    fields.insert(col::DEACTIVATION_REASON.into(), json!(reason));

    let msg = if self.config.hard_delete {
      self.store.update_item(PERSONS_LIST, id, fields).await.map_err(FormError::remote)?;
      let removed = DocumentReconciler::new(&*self.store).delete_all(&key).await?;
      self.store.delete_item(PERSONS_LIST, id).await.map_err(FormError::remote)?;
      tracing::debug!(person_key = %key, removed, "person and documentation deleted");
      DELETED
    } else {
      fields.insert(col::ACTIVE.into(), json!(false));
      self.store.update_item(PERSONS_LIST, id, fields).await.map_err(FormError::remote)?;
      DEACTIVATED
    };

    self.reset_form();
    BestEffort::absorb("reloading grid", self.reload_grid().await);
    Ok(msg)
  }

  // ── View ──────────────────────────────────────────────────────────────

  pub fn view(&self) -> FormView {
    let is_driver = self.draft.is_driver();
    let documents = self
      .documents
      .iter()
      .map(|r| DocumentRowView {
        label:        r.label,
        date_kind:    r.label.date_kind(),
        date:         r.date,
        accepts_file: r.label.accepts_file(),
        required:     self.mode == Mode::Create && Documents::is_required(r.label, is_driver),
        pending_file: r.file.as_ref().map(|f| f.name.clone()),
        attachments:  r.attachments.clone(),
      })
      .collect();

    FormView {
      mode: self.mode,
      draft: self.draft.clone(),
      read_only: self.mode == Mode::Deactivate || self.saving,
      work_data_locked: self.draft.work_data_locked(),
      show_role_other: self.draft.role == Some(JobRole::Other),
      show_license: is_driver,
      provider: ProviderView {
        locked:   self.provider.is_locked(),
        selected: self.provider.selected(),
        name:     self.provider.selected_name().map(str::to_owned),
        options:  self.provider.options().to_vec(),
      },
      documents,
      grid: (self.mode != Mode::Create).then(|| self.grid_view()),
      can_save: self.can_save(),
      saving: self.saving,
      deactivation: self.deactivation.clone(),
      policy_error: self.date_policy_error(),
      error: self.error.clone(),
      success: self.success.clone(),
      warnings: self.warnings.clone(),
    }
  }

  fn grid_view(&self) -> GridView {
    let rows: Vec<GridRow> = self.visible_grid().into_iter().map(GridRow::from).collect();
    let empty = match (self.grid_loaded, rows.is_empty(), self.grid.is_empty()) {
      (true, true, true) => Some("No hay registros.".to_owned()),
      (true, true, false) => Some("Sin resultados para la búsqueda.".to_owned()),
      _ => None,
    };
    GridView { search: self.search.clone(), rows, selected: self.selected, empty }
  }
}
