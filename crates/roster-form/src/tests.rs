//! Form flows against an in-memory `SqliteStore`.

use std::sync::Arc;

use bytes::Bytes;
use chrono::NaiveDate;
use roster_core::{
  document::{DocDate, DocumentLabel},
  item::{AddOutcome, AttachmentInfo, FieldMetadata, Fields, Item, ItemId, PendingFile, UserRef},
  person::{DocumentType, JobRole, LicenseCategory},
  query::{Filter, ListQuery},
  schema::{DOCUMENTS_LIST, PERSONS_LIST, PROVIDERS_LIST},
  store::ListStore,
};
use roster_store_sqlite::SqliteStore;
use serde_json::{Value, json};

use crate::{
  BestEffort, FormController, FormEdit, FormError, HostConfig, Mode, SaveOutcome,
  reconcile::DocumentReconciler,
};

const ME: i64 = 7;

fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 10, 18).unwrap() }

fn fields(v: Value) -> Fields {
  match v {
    Value::Object(m) => m,
    _ => panic!("expected an object"),
  }
}

fn pdf(name: &str) -> PendingFile { PendingFile::new(name, Bytes::from_static(b"%PDF-1.4")) }

async fn store(multi_provider: bool) -> Arc<SqliteStore> {
  let s = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
    .with_current_user(UserRef { id: ME });
  s.provision_registry(multi_provider).await.expect("provision");
  Arc::new(s)
}

async fn add_provider(s: &SqliteStore, name: &str, members: &[i64]) -> ItemId {
  s.add_item(PROVIDERS_LIST, fields(json!({ "Title": name, "UsuariosId": { "results": members } })))
    .await
    .unwrap()
    .id
    .unwrap()
}

async fn form(s: &Arc<SqliteStore>, config: HostConfig) -> FormController<SqliteStore> {
  let mut f = FormController::new(Arc::clone(s), config).with_today(today());
  f.mount().await;
  f
}

/// Fill in a complete driver with all five documents.
async fn fill_driver(f: &mut FormController<SqliteStore>, doc: &str, name: &str) {
  f.apply(FormEdit::DocumentType(Some(DocumentType::NationalId))).await.unwrap();
  f.apply(FormEdit::DocumentNumber(doc.into())).await.unwrap();
  f.apply(FormEdit::GivenName(name.into())).await.unwrap();
  f.apply(FormEdit::PaternalSurname("Pérez".into())).await.unwrap();
  f.apply(FormEdit::Role(Some(JobRole::Driver))).await.unwrap();
  f.apply(FormEdit::LicenseNumber("B1234".into())).await.unwrap();
  f.apply(FormEdit::LicenseCategory(Some(LicenseCategory::A))).await.unwrap();
  for label in DocumentLabel::all() {
    f.set_document_date(label, Some(today())).unwrap();
    if label.accepts_file() {
      f.set_document_file(label, Some(pdf(&format!("{label}.pdf")))).unwrap();
    }
  }
}

async fn documentation(s: &SqliteStore, key: &str) -> Vec<Item> {
  s.query(DOCUMENTS_LIST, &ListQuery::new().filter(Filter::eq("Title", key))).await.unwrap()
}

async fn people(s: &SqliteStore) -> Vec<Item> {
  s.query(PERSONS_LIST, &ListQuery::new()).await.unwrap()
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_driver_writes_person_and_five_documents() {
  let s = store(false).await;
  let pid = add_provider(&s, "Transportes Sur", &[]).await;
  let mut f = form(&s, HostConfig::default()).await;

  f.select_provider(Some(pid)).await.unwrap();
  fill_driver(&mut f, "87654321", "Ana").await;
  assert!(f.can_save());
  assert_eq!(f.save().await, SaveOutcome::Saved);

  let persons = people(&s).await;
  assert_eq!(persons.len(), 1);
  assert_eq!(persons[0].text("Title"), Some("87654321"));
  assert_eq!(persons[0].lookup_ids("ProveedorId"), vec![pid]);
  assert_eq!(persons[0].flag("activo"), Some(true));

  let docs = documentation(&s, "87654321").await;
  assert_eq!(docs.len(), 5);
  for doc in &docs {
    let files = s.list_attachments(DOCUMENTS_LIST, doc.id).await.unwrap();
    let certificate = doc.text("Documento").and_then(|l| l.parse::<DocumentLabel>().ok()).unwrap();
    assert_eq!(files.len(), usize::from(certificate.accepts_file()));
  }

  // The form resets but the success message stays.
  let view = f.view();
  assert!(view.draft.document_number.is_empty());
  assert_eq!(view.success.as_deref(), Some("Ingresado en Personas y Documentación."));
}

#[tokio::test]
async fn create_non_driver_skips_license_row() {
  let s = store(false).await;
  let pid = add_provider(&s, "Transportes Sur", &[]).await;
  let mut f = form(&s, HostConfig::default()).await;
  f.select_provider(Some(pid)).await.unwrap();
  fill_driver(&mut f, "87654321", "Ana").await;
  f.apply(FormEdit::Role(Some(JobRole::Loader))).await.unwrap();

  assert_eq!(f.save().await, SaveOutcome::Saved);
  let docs = documentation(&s, "87654321").await;
  let mut labels: Vec<_> = docs.iter().filter_map(|d| d.text("Documento")).collect();
  labels.sort_unstable();
  assert_eq!(
    labels,
    ["Antecedentes penales", "Antecedentes policiales", "Carnet de sanidad", "DNI"]
  );
}

#[tokio::test]
async fn create_is_blocked_until_mandatory_documents_are_present() {
  let s = store(false).await;
  let pid = add_provider(&s, "Transportes Sur", &[]).await;
  let mut f = form(&s, HostConfig::default()).await;
  f.select_provider(Some(pid)).await.unwrap();
  fill_driver(&mut f, "87654321", "Ana").await;
  f.set_document_file(DocumentLabel::HealthCertificate, None).unwrap();

  assert!(!f.can_save());
  assert_eq!(f.save().await, SaveOutcome::Blocked);
  assert!(people(&s).await.is_empty());
}

#[tokio::test]
async fn stale_certificate_blocks_save_with_cutoff_message() {
  let s = store(false).await;
  let pid = add_provider(&s, "Transportes Sur", &[]).await;
  let mut f = form(&s, HostConfig::default()).await;
  f.select_provider(Some(pid)).await.unwrap();
  fill_driver(&mut f, "87654321", "Ana").await;
  f.set_document_date(DocumentLabel::CriminalBackground, NaiveDate::from_ymd_opt(2025, 10, 17))
    .unwrap();

  assert_eq!(f.save().await, SaveOutcome::Blocked);
  assert_eq!(
    f.error(),
    Some("La fecha de emisión de \"Antecedentes penales\" no puede ser anterior a 18/10/2025.")
  );
  assert!(people(&s).await.is_empty());

  // Fixing the date clears the pending error.
  f.set_document_date(DocumentLabel::CriminalBackground, Some(today())).unwrap();
  assert!(f.can_save());
}

#[tokio::test]
async fn editable_mode_requires_provider() {
  let s = store(false).await;
  let mut f = form(&s, HostConfig::default()).await;
  fill_driver(&mut f, "87654321", "Ana").await;

  assert_eq!(f.save().await, SaveOutcome::Blocked);
  assert_eq!(f.error(), Some("Empresa es obligatoria."));
}

#[tokio::test]
async fn duplicate_document_number_is_translated() {
  let s = store(false).await;
  let pid = add_provider(&s, "Transportes Sur", &[]).await;
  let mut f = form(&s, HostConfig::default()).await;
  f.select_provider(Some(pid)).await.unwrap();

  fill_driver(&mut f, "87654321", "Ana").await;
  assert_eq!(f.save().await, SaveOutcome::Saved);
  fill_driver(&mut f, "87654321", "Otra").await;
  assert_eq!(f.save().await, SaveOutcome::Failed);
  assert_eq!(
    f.error(),
    Some("Ya existe un registro con el documento 87654321. No se puede guardar duplicado.")
  );
  assert_eq!(people(&s).await.len(), 1);
}

// ─── Edits ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn leaving_driver_role_clears_license_fields() {
  let s = store(false).await;
  let mut f = form(&s, HostConfig::default()).await;
  fill_driver(&mut f, "87654321", "Ana").await;

  f.apply(FormEdit::Role(Some(JobRole::Loader))).await.unwrap();
  let view = f.view();
  assert!(view.draft.license_number.is_empty());
  assert_eq!(view.draft.license_category, None);
  assert!(!view.show_license);
  assert!(f.apply(FormEdit::LicenseNumber("B9".into())).await.is_err());
}

#[tokio::test]
async fn work_data_waits_for_document_number() {
  let s = store(false).await;
  let mut f = form(&s, HostConfig::default()).await;
  f.apply(FormEdit::DocumentType(Some(DocumentType::Passport))).await.unwrap();
  f.apply(FormEdit::DocumentNumber("12345678".into())).await.unwrap();

  assert!(f.view().work_data_locked);
  assert!(matches!(
    f.apply(FormEdit::Role(Some(JobRole::Driver))).await,
    Err(FormError::Validation(_))
  ));

  f.apply(FormEdit::DocumentNumber("123456789".into())).await.unwrap();
  f.apply(FormEdit::Role(Some(JobRole::Driver))).await.unwrap();
  assert!(f.view().show_license);
}

#[tokio::test]
async fn identity_documents_take_no_file() {
  let s = store(false).await;
  let mut f = form(&s, HostConfig::default()).await;
  assert!(f.set_document_file(DocumentLabel::Id, Some(pdf("dni.pdf"))).is_err());
  assert!(f.set_document_file(DocumentLabel::License, Some(pdf("lic.pdf"))).is_err());
}

// ─── Document reconciler ─────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_twice_keeps_one_record() {
  let s = store(false).await;
  let r = DocumentReconciler::new(&*s);
  let date = DocDate::Issued(NaiveDate::from_ymd_opt(2026, 9, 1));

  let first = r.upsert("87654321", DocumentLabel::HealthCertificate, date, None).await.unwrap();
  let second = r.upsert("87654321", DocumentLabel::HealthCertificate, date, None).await.unwrap();
  assert!(first.created);
  assert!(!second.created);
  assert_eq!(first.id, second.id);

  let docs = documentation(&s, "87654321").await;
  assert_eq!(docs.len(), 1);
  assert_eq!(docs[0].text("Emision"), Some("2026-09-01"));
  assert_eq!(docs[0].fields.get("Caducidad"), None);
}

#[tokio::test]
async fn upsert_with_file_replaces_all_attachments() {
  let s = store(false).await;
  let r = DocumentReconciler::new(&*s);
  let date = DocDate::Issued(Some(today()));
  let report = r.upsert("87654321", DocumentLabel::PoliceBackground, date, None).await.unwrap();
  for name in ["a.pdf", "b.pdf", "c.pdf"] {
    s.add_attachment(DOCUMENTS_LIST, report.id, name, Bytes::from_static(b"x")).await.unwrap();
  }

  let report = r
    .upsert("87654321", DocumentLabel::PoliceBackground, date, Some(&pdf("nuevo.pdf")))
    .await
    .unwrap();
  assert_eq!(report.cleanup.len(), 3);
  assert!(report.cleanup.iter().all(|c| !c.is_ignored()));

  let files = s.list_attachments(DOCUMENTS_LIST, report.id).await.unwrap();
  assert_eq!(files.len(), 1);
  assert_eq!(files[0].file_name, "nuevo.pdf");
}

#[tokio::test]
async fn upsert_targets_latest_match() {
  let s = store(false).await;
  let older = s
    .add_item(DOCUMENTS_LIST, fields(json!({ "Title": "87654321", "Documento": "DNI" })))
    .await
    .unwrap();
  let newer = s
    .add_item(DOCUMENTS_LIST, fields(json!({ "Title": "87654321", "Documento": "DNI" })))
    .await
    .unwrap();

  let r = DocumentReconciler::new(&*s);
  let report = r
    .upsert("87654321", DocumentLabel::Id, DocDate::Expiry(Some(today())), None)
    .await
    .unwrap();
  assert_eq!(Some(report.id), newer.id);
  assert_ne!(Some(report.id), older.id);
}

#[tokio::test]
async fn upsert_requires_person_key() {
  let s = store(false).await;
  let r = DocumentReconciler::new(&*s);
  let err = r.upsert("  ", DocumentLabel::Id, DocDate::Expiry(None), None).await.unwrap_err();
  assert!(matches!(err, FormError::Validation(_)));
  assert!(documentation(&s, "").await.is_empty());
}

/// A store whose writes never report the new identifier.
struct SilentIds(Arc<SqliteStore>);

impl ListStore for SilentIds {
  type Error = roster_store_sqlite::Error;

  async fn query(&self, list: &str, query: &ListQuery) -> Result<Vec<Item>, Self::Error> {
    self.0.query(list, query).await
  }

  async fn add_item(&self, list: &str, fields: Fields) -> Result<AddOutcome, Self::Error> {
    self.0.add_item(list, fields).await?;
    Ok(AddOutcome { id: None })
  }

  async fn update_item(&self, list: &str, id: ItemId, fields: Fields) -> Result<(), Self::Error> {
    self.0.update_item(list, id, fields).await
  }

  async fn delete_item(&self, list: &str, id: ItemId) -> Result<(), Self::Error> {
    self.0.delete_item(list, id).await
  }

  async fn list_attachments(
    &self,
    list: &str,
    id: ItemId,
  ) -> Result<Vec<AttachmentInfo>, Self::Error> {
    self.0.list_attachments(list, id).await
  }

  async fn add_attachment(
    &self,
    list: &str,
    id: ItemId,
    file_name: &str,
    content: Bytes,
  ) -> Result<AttachmentInfo, Self::Error> {
    self.0.add_attachment(list, id, file_name, content).await
  }

  async fn delete_attachment(
    &self,
    list: &str,
    id: ItemId,
    file_name: &str,
  ) -> Result<(), Self::Error> {
    self.0.delete_attachment(list, id, file_name).await
  }

  async fn field(&self, list: &str, name: &str) -> Result<Option<FieldMetadata>, Self::Error> {
    self.0.field(list, name).await
  }
}

#[tokio::test]
async fn missing_id_in_add_response_is_requeried() {
  let s = store(false).await;
  let silent = SilentIds(Arc::clone(&s));
  let r = DocumentReconciler::new(&silent);

  let report = r
    .upsert("87654321", DocumentLabel::HealthCertificate, DocDate::Issued(Some(today())), Some(&pdf("s.pdf")))
    .await
    .unwrap();
  assert!(report.created);

  let docs = documentation(&s, "87654321").await;
  assert_eq!(docs.len(), 1);
  assert_eq!(docs[0].id, report.id);
  assert_eq!(s.list_attachments(DOCUMENTS_LIST, report.id).await.unwrap().len(), 1);
}

// ─── Provider resolution ─────────────────────────────────────────────────────

#[tokio::test]
async fn locked_mode_detects_provider_and_writes_multi_payload() {
  let s = store(true).await;
  add_provider(&s, "Otra Empresa", &[99]).await;
  let pid = add_provider(&s, "Transportes Sur", &[3, ME]).await;

  let config = HostConfig { lock_provider: true, filter_by_provider: true, ..HostConfig::default() };
  let mut f = FormController::new(Arc::clone(&s), config).with_today(today());
  let report = f.mount().await;
  assert_eq!(report.detected, Some(BestEffort::Ok(Some(pid))));
  assert_eq!(report.shape, BestEffort::Ok(true));

  let view = f.view();
  assert!(view.provider.locked);
  assert_eq!(view.provider.name.as_deref(), Some("Transportes Sur"));
  assert!(f.select_provider(None).await.is_err());

  fill_driver(&mut f, "87654321", "Ana").await;
  assert_eq!(f.save().await, SaveOutcome::Saved);
  let persons = people(&s).await;
  assert_eq!(persons[0].fields.get("ProveedorId"), Some(&json!([pid])));

  // The provider-filtered grid shows the new person.
  f.set_mode(Mode::Modify).await;
  let grid = f.view().grid.unwrap();
  assert_eq!(grid.rows.len(), 1);
  assert_eq!(grid.rows[0].document_number, "87654321");
}

#[tokio::test]
async fn locked_mode_without_membership_saves_without_provider() {
  let s = store(false).await;
  add_provider(&s, "Otra Empresa", &[99]).await;

  let config = HostConfig { lock_provider: true, ..HostConfig::default() };
  let mut f = form(&s, config).await;
  assert_eq!(f.provider().selected(), None);

  fill_driver(&mut f, "87654321", "Ana").await;
  assert_eq!(f.save().await, SaveOutcome::Saved);
  assert_eq!(people(&s).await[0].fields.get("ProveedorId"), None);
}

// ─── Grid ────────────────────────────────────────────────────────────────────

async fn seeded(config: HostConfig) -> (Arc<SqliteStore>, FormController<SqliteStore>, ItemId) {
  let s = store(false).await;
  let pid = add_provider(&s, "Transportes Sur", &[ME]).await;
  let mut f = form(&s, config).await;
  f.select_provider(Some(pid)).await.unwrap();
  fill_driver(&mut f, "87654321", "Ana").await;
  assert_eq!(f.save().await, SaveOutcome::Saved);
  (s, f, pid)
}

#[tokio::test]
async fn superseded_grid_load_is_discarded() {
  let (s, mut f, pid) = seeded(HostConfig::default()).await;
  f.set_mode(Mode::Modify).await;

  let a = f.begin_grid_load();
  let rows_a = FormController::fetch_grid(&*s, &a).await;

  s.add_item(
    PERSONS_LIST,
    fields(json!({ "Title": "12345678", "Nombre": "Luis", "activo": true, "ProveedorId": pid })),
  )
  .await
  .unwrap();
  let b = f.begin_grid_load();
  let rows_b = FormController::fetch_grid(&*s, &b).await;

  assert!(f.commit_grid(b, rows_b).unwrap());
  assert!(!f.commit_grid(a, rows_a).unwrap());
  assert_eq!(f.view().grid.unwrap().rows.len(), 2);
}

#[tokio::test]
async fn grid_lists_newest_registration_first() {
  let (s, mut f, pid) = seeded(HostConfig::default()).await;
  s.add_item(
    PERSONS_LIST,
    fields(json!({ "Title": "12345678", "Nombre": "Luis", "activo": true, "ProveedorId": pid })),
  )
  .await
  .unwrap();

  f.set_mode(Mode::Modify).await;
  let numbers: Vec<_> =
    f.view().grid.unwrap().rows.into_iter().map(|r| r.document_number).collect();
  assert_eq!(numbers, ["12345678", "87654321"]);
}

#[tokio::test]
async fn unmount_discards_in_flight_loads() {
  let (s, mut f, _) = seeded(HostConfig::default()).await;
  f.set_mode(Mode::Modify).await;
  let req = f.begin_grid_load();
  let rows = FormController::fetch_grid(&*s, &req).await;
  f.unmount();
  assert!(!f.commit_grid(req, rows).unwrap());
}

#[tokio::test]
async fn grid_search_distinguishes_no_match_from_no_records() {
  let (s, mut f, pid) = seeded(HostConfig::default()).await;
  s.add_item(
    PERSONS_LIST,
    fields(json!({ "Title": "12345678", "Nombre": "Luis", "activo": true, "ProveedorId": pid })),
  )
  .await
  .unwrap();
  f.set_mode(Mode::Modify).await;

  f.set_search("LUIS");
  let grid = f.view().grid.unwrap();
  assert_eq!(grid.rows.len(), 1);
  assert_eq!(grid.rows[0].full_name, "Luis");

  f.set_search("zzz");
  let grid = f.view().grid.unwrap();
  assert!(grid.rows.is_empty());
  assert_eq!(grid.empty.as_deref(), Some("Sin resultados para la búsqueda."));
}

#[tokio::test]
async fn provider_filter_excludes_other_providers() {
  let (s, mut f, _) = seeded(HostConfig { filter_by_provider: true, ..HostConfig::default() }).await;
  let other = add_provider(&s, "Otra Empresa", &[]).await;
  s.add_item(
    PERSONS_LIST,
    fields(json!({ "Title": "12345678", "Nombre": "Luis", "activo": true, "ProveedorId": other })),
  )
  .await
  .unwrap();

  f.set_mode(Mode::Modify).await;
  let grid = f.view().grid.unwrap();
  assert_eq!(grid.rows.len(), 1);
  assert_eq!(grid.rows[0].document_number, "87654321");
}

// ─── Modify ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn modify_updates_person_and_replaces_one_file() {
  let config = HostConfig { site_base_url: "https://intranet.example/sites/rrhh/".into(), ..HostConfig::default() };
  let (s, mut f, _) = seeded(config).await;
  f.set_mode(Mode::Modify).await;
  let id = f.view().grid.unwrap().rows[0].id;

  f.select_row(id).await.unwrap();
  let view = f.view();
  assert_eq!(view.draft.given_name, "Ana");
  assert_eq!(view.provider.name.as_deref(), Some("Transportes Sur"));
  let health = view.documents.iter().find(|d| d.label == DocumentLabel::HealthCertificate).unwrap();
  assert_eq!(health.date, Some(today()));
  let docs = documentation(&s, "87654321").await;
  let health_id = docs.iter().find(|d| d.text("Documento") == Some("Carnet de sanidad")).unwrap().id;
  assert_eq!(
    health.attachments[0].href,
    format!(
      "https://intranet.example/sites/rrhh/Lists/Documentacion/Attachments/{health_id}/Carnet de sanidad.pdf"
    )
  );

  f.apply(FormEdit::GivenName("Ana María".into())).await.unwrap();
  f.set_document_file(DocumentLabel::HealthCertificate, Some(pdf("renovado.pdf"))).unwrap();
  assert_eq!(f.save().await, SaveOutcome::Saved);
  assert_eq!(
    f.success(),
    Some("Registro modificado. Documentación actualizada sin borrar adjuntos.")
  );

  assert_eq!(people(&s).await[0].text("Nombre"), Some("Ana María"));
  assert_eq!(documentation(&s, "87654321").await.len(), 5);

  let view = f.view();
  let health = view.documents.iter().find(|d| d.label == DocumentLabel::HealthCertificate).unwrap();
  assert_eq!(health.attachments.len(), 1);
  assert_eq!(health.attachments[0].name, "renovado.pdf");
  assert_eq!(health.pending_file, None);
  // Untouched rows keep their files.
  let police = view.documents.iter().find(|d| d.label == DocumentLabel::PoliceBackground).unwrap();
  assert_eq!(police.attachments.len(), 1);
}

#[tokio::test]
async fn switching_to_deactivate_keeps_loaded_person() {
  let (_s, mut f, _) = seeded(HostConfig::default()).await;
  f.set_mode(Mode::Modify).await;
  let id = f.view().grid.unwrap().rows[0].id;
  f.select_row(id).await.unwrap();

  f.set_mode(Mode::Deactivate).await;
  let view = f.view();
  assert_eq!(view.draft.document_number, "87654321");
  assert_eq!(view.draft.given_name, "Ana");
  assert_eq!(view.grid.unwrap().selected, Some(id));
  assert_eq!(f.documents().get(DocumentLabel::Id).date, Some(today()));

  // Create starts from a blank form.
  f.set_mode(Mode::Create).await;
  let view = f.view();
  assert!(view.draft.document_number.is_empty());
  assert_eq!(f.selected(), None);
}

#[tokio::test]
async fn modify_unknown_document_number_fails() {
  let (_s, mut f, pid) = seeded(HostConfig::default()).await;
  f.set_mode(Mode::Modify).await;
  f.select_provider(Some(pid)).await.unwrap();
  f.apply(FormEdit::DocumentType(Some(DocumentType::NationalId))).await.unwrap();
  f.apply(FormEdit::DocumentNumber("11112222".into())).await.unwrap();
  f.apply(FormEdit::GivenName("Nadie".into())).await.unwrap();

  assert_eq!(f.save().await, SaveOutcome::Failed);
  assert_eq!(f.error(), Some("No se pudo guardar: No existe persona con ese Documento."));
}

#[tokio::test]
async fn modify_reloads_documents_when_number_changes() {
  let (_s, mut f, _) = seeded(HostConfig::default()).await;
  f.set_mode(Mode::Modify).await;
  f.apply(FormEdit::DocumentNumber("87654321".into())).await.unwrap();
  let dni = f.documents().get(DocumentLabel::Id).date;
  assert_eq!(dni, Some(today()));

  f.apply(FormEdit::DocumentNumber(String::new())).await.unwrap();
  assert_eq!(f.documents().get(DocumentLabel::Id).date, None);
}

// ─── Deactivate ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn hard_delete_needs_reason_then_removes_everything() {
  let (s, mut f, _) = seeded(HostConfig { hard_delete: true, ..HostConfig::default() }).await;
  f.set_mode(Mode::Deactivate).await;
  let id = f.view().grid.unwrap().rows[0].id;
  f.select_row(id).await.unwrap();
  assert!(f.apply(FormEdit::GivenName("x".into())).await.is_err());

  assert_eq!(f.save().await, SaveOutcome::AwaitingConfirmation);
  assert_eq!(f.save().await, SaveOutcome::Blocked);
  let view = f.view();
  assert_eq!(view.deactivation.as_deref(), Some(""));
  assert_eq!(view.error.as_deref(), Some("Ingresá el motivo de la baja."));
  assert_eq!(people(&s).await.len(), 1);
  assert_eq!(documentation(&s, "87654321").await.len(), 5);

  f.set_deactivation_reason("renuncia").unwrap();
  assert_eq!(f.save().await, SaveOutcome::Saved);
  assert!(people(&s).await.is_empty());
  assert!(documentation(&s, "87654321").await.is_empty());

  let view = f.view();
  assert_eq!(view.success.as_deref(), Some("Registro eliminado de Personas y toda la Documentación."));
  assert_eq!(view.deactivation, None);
  let grid = view.grid.unwrap();
  assert_eq!(grid.selected, None);
  assert_eq!(grid.empty.as_deref(), Some("No hay registros."));
}

#[tokio::test]
async fn deactivate_requires_provider_in_editable_mode() {
  let (s, mut f, _) = seeded(HostConfig::default()).await;
  f.set_mode(Mode::Deactivate).await;
  let id = f.view().grid.unwrap().rows[0].id;
  f.select_row(id).await.unwrap();
  f.select_provider(None).await.unwrap();

  assert_eq!(f.save().await, SaveOutcome::Blocked);
  assert_eq!(f.error(), Some("Empresa es obligatoria."));
  assert_eq!(f.view().deactivation, None);
  assert_eq!(people(&s).await[0].flag("activo"), Some(true));
}

#[tokio::test]
async fn soft_deactivation_flags_person_and_keeps_documents() {
  let (s, mut f, _) = seeded(HostConfig::default()).await;
  f.set_mode(Mode::Deactivate).await;
  let id = f.view().grid.unwrap().rows[0].id;
  f.select_row(id).await.unwrap();

  assert_eq!(f.save().await, SaveOutcome::AwaitingConfirmation);
  f.set_deactivation_reason("  renuncia ").unwrap();
  assert_eq!(f.confirm_deactivation().await, SaveOutcome::Saved);

  let persons = people(&s).await;
  assert_eq!(persons[0].flag("activo"), Some(false));
  assert_eq!(persons[0].text("motivobaja"), Some("renuncia"));
  assert_eq!(documentation(&s, "87654321").await.len(), 5);
  assert_eq!(f.success(), Some("Registro marcado como inactivo."));
  assert!(f.view().grid.unwrap().rows.is_empty());
}

#[tokio::test]
async fn cancel_clears_form_and_selection() {
  let (_s, mut f, _) = seeded(HostConfig::default()).await;
  f.set_mode(Mode::Deactivate).await;
  let id = f.view().grid.unwrap().rows[0].id;
  f.select_row(id).await.unwrap();
  assert_eq!(f.save().await, SaveOutcome::AwaitingConfirmation);

  f.cancel();
  let view = f.view();
  assert_eq!(view.deactivation, None);
  assert!(view.draft.document_number.is_empty());
  assert_eq!(view.grid.unwrap().selected, None);
  assert!(view.documents.iter().all(|d| d.date.is_none()));
}
