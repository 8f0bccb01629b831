//! Names of the lists and columns this registry reads and writes.
//!
//! The remote store owns the schema; these constants only mirror it.

/// List holding one item per registered person.
pub const PERSONS_LIST: &str = "Personal";
/// List holding one item per (person, document label) pair.
pub const DOCUMENTS_LIST: &str = "Documentacion";
/// List of provider organisations.
pub const PROVIDERS_LIST: &str = "Proveedores";

/// Common to every list; identity column and display title.
pub const ID: &str = "Id";
pub const TITLE: &str = "Title";

pub mod person {
  /// The document number lives in the title column.
  pub const DOCUMENT_NUMBER: &str = super::TITLE;
  pub const GIVEN_NAME: &str = "Nombre";
  pub const PATERNAL_SURNAME: &str = "Apellido_x0020_paterno";
  pub const MATERNAL_SURNAME: &str = "Apellido_x0020_materno";
  pub const DOCUMENT_TYPE: &str = "tipodocumento";
  pub const ROLE: &str = "puesto";
  pub const ROLE_OTHER: &str = "otro";
  pub const LICENSE_NUMBER: &str = "Licencia";
  pub const LICENSE_CATEGORY: &str = "Categoria";
  pub const NOTIFICATION_EMAILS: &str = "correosnotificacion";
  pub const ACTIVE: &str = "activo";
  pub const DEACTIVATION_REASON: &str = "motivobaja";
  /// Display name of the provider relationship column.
  pub const PROVIDER: &str = "Proveedor";
  /// Id projection of the provider relationship column.
  pub const PROVIDER_ID: &str = "ProveedorId";
}

pub mod document {
  /// Owning person's document number, matched by value.
  pub const PERSON_KEY: &str = super::TITLE;
  pub const LABEL: &str = "Documento";
  pub const EXPIRY: &str = "Caducidad";
  pub const ISSUED: &str = "Emision";
}

pub mod provider {
  /// Multi-valued user lookup with the provider's members.
  pub const MEMBERS: &str = "Usuarios";
  /// Lookup projection across the expanded members.
  pub const MEMBERS_EXPANDED_ID: &str = "Usuarios/Id";
  /// Flat id projection of the members column.
  pub const MEMBERS_ID: &str = "UsuariosId";
}
