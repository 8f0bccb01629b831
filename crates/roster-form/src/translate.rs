//! Turning raw store faults into messages a user can act on.
//!
//! Store errors arrive in many shapes: a structured JSON body, a message that
//! embeds such a body after transport diagnostics (`... => {"error": ..}`), a
//! bare status text, or nothing at all. [`friendly_message`] digs out the most
//! specific text, recognises duplicate-key violations, and never returns an
//! empty or purely technical string.

use std::sync::LazyLock;

use regex::Regex;
use roster_core::fault::RemoteFault;
use serde_json::Value;

use crate::FormError;

pub const GENERIC_FAILURE: &str = "No se pudo guardar. Revisá los datos e intentá nuevamente.";
const FAILURE_PREFIX: &str = "No se pudo guardar: ";

/// Lower-cased markers of a duplicate-key violation.
const DUPLICATE_MARKERS: &[&str] =
  &["spduplicatevaluesfoundexception", "valores duplicados", "duplicate"];

/// Separator between transport diagnostics and the embedded fault body.
const DIAGNOSTIC_SEPARATOR: &str = "=>";

static EMBEDDED_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r#"(?i)"message"\s*:\s*\{\s*"lang"\s*:\s*"[^"]*"\s*,\s*"value"\s*:\s*"((?:\\.|[^"\\])*)"\s*\}"#,
  )
  .expect("static pattern")
});
static ERROR_PREFIX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)^Error:\s*").expect("static pattern"));
static TRANSPORT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)^Error making HttpClient request.*?=>\s*").expect("static pattern")
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static pattern"));
/// Start of the store's own domain-error sentence ("El elemento ...").
static DOMAIN_MARKER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)el elemento").expect("static pattern"));

// ─── Extraction ──────────────────────────────────────────────────────────────

/// `message.value`, or `message` itself when it is a plain string.
fn message_of(error: &Value) -> Option<String> {
  let message = error.get("message")?;
  match message {
    Value::String(s) => Some(s.clone()),
    other => other.get("value").and_then(Value::as_str).map(str::to_owned),
  }
}

/// The message inside a structured fault body, wherever the backend put it.
fn body_message(body: &Value) -> Option<String> {
  body
    .get("odata.error")
    .and_then(message_of)
    .or_else(|| body.get("odata").and_then(|o| o.get("error")).and_then(message_of))
    .or_else(|| body.get("error").and_then(message_of))
    .filter(|s| !s.trim().is_empty())
}

/// Step 1: the most specific text the fault carries.
fn raw_message(fault: &RemoteFault) -> String {
  fault
    .body
    .as_ref()
    .and_then(body_message)
    .or_else(|| fault.message.clone().filter(|s| !s.trim().is_empty()))
    .or_else(|| fault.status_text.clone().filter(|s| !s.trim().is_empty()))
    .unwrap_or_else(|| "Error".to_owned())
}

/// Step 2: a fault body embedded in the message text, if any.
fn embedded_message(s: &str) -> Option<String> {
  let candidate = s
    .find(DIAGNOSTIC_SEPARATOR)
    .map_or(s, |idx| &s[idx + DIAGNOSTIC_SEPARATOR.len()..])
    .trim();

  if candidate.starts_with('{')
    && let Ok(body) = serde_json::from_str::<Value>(candidate)
    && let Some(msg) = body_message(&body)
  {
    return Some(msg);
  }

  let escaped = EMBEDDED_MESSAGE.captures(s)?.get(1)?.as_str();
  Some(
    serde_json::from_str::<String>(&format!("\"{escaped}\"")).unwrap_or_else(|_| escaped.to_owned()),
  )
}

/// Step 3: drop transport prefixes and collapse whitespace.
fn strip_technical_prefix(s: &str) -> String {
  let s = ERROR_PREFIX.replace(s, "");
  let s = TRANSPORT_PREFIX.replace(&s, "");
  WHITESPACE.replace_all(&s, " ").trim().to_owned()
}

fn is_duplicate(msg: &str) -> bool {
  let lower = msg.to_lowercase();
  DUPLICATE_MARKERS.iter().any(|m| lower.contains(m))
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// A user-safe, never-empty message for `fault`.
///
/// `document_number` is the number currently on the form; it is named in the
/// duplicate-key message when known.
pub fn friendly_message(fault: &RemoteFault, document_number: Option<&str>) -> String {
  let raw = raw_message(fault);
  let raw = raw.trim();
  let msg = strip_technical_prefix(&embedded_message(raw).unwrap_or_else(|| raw.to_owned()));

  if is_duplicate(&msg) {
    return match document_number.map(str::trim).filter(|d| !d.is_empty()) {
      Some(doc) => {
        format!("Ya existe un registro con el documento {doc}. No se puede guardar duplicado.")
      }
      None => "Ya existe un registro con ese documento. No se puede guardar duplicado.".to_owned(),
    };
  }

  let msg = match DOMAIN_MARKER.find(&msg) {
    Some(m) => msg[m.start()..].trim().to_owned(),
    None => msg,
  };

  if msg.is_empty() || msg.eq_ignore_ascii_case("error") {
    return GENERIC_FAILURE.to_owned();
  }
  format!("{FAILURE_PREFIX}{msg}")
}

/// How a [`FormError`] is shown: validation problems verbatim, everything
/// else through [`friendly_message`].
pub fn describe(err: &FormError, document_number: Option<&str>) -> String {
  match err {
    FormError::Validation(m) if !m.trim().is_empty() => m.clone(),
    other => friendly_message(&other.to_fault(), document_number),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn nested_duplicate_names_document() {
    let fault = RemoteFault::from_body(json!({
      "odata.error": {
        "code": "-2130575169",
        "message": { "lang": "es-ES", "value": "Valores duplicados encontrados" }
      }
    }));
    assert_eq!(
      friendly_message(&fault, Some("12345678")),
      "Ya existe un registro con el documento 12345678. No se puede guardar duplicado."
    );
  }

  #[test]
  fn duplicate_without_document_number() {
    let fault = RemoteFault::from_message("Duplicate key");
    assert_eq!(
      friendly_message(&fault, Some("  ")),
      "Ya existe un registro con ese documento. No se puede guardar duplicado."
    );
  }

  #[test]
  fn bare_fault_falls_back_to_generic() {
    assert_eq!(friendly_message(&RemoteFault::default(), None), GENERIC_FAILURE);
    assert_eq!(friendly_message(&RemoteFault::from_message("Error: "), None), GENERIC_FAILURE);
  }

  #[test]
  fn embedded_body_after_diagnostics_is_parsed() {
    let msg = r#"Error making HttpClient request in queryable [400] Bad Request ==> {"odata.error":{"code":"x","message":{"lang":"es-ES","value":"Falta el campo Nombre"}}}"#;
    let fault = RemoteFault::from_message(msg);
    assert_eq!(friendly_message(&fault, None), "No se pudo guardar: Falta el campo Nombre");
  }

  #[test]
  fn embedded_message_pattern_is_unescaped() {
    let msg = r#"[500] weird {"message": {"lang": "en-US", "value": "Line \"one\"\nand two"} trailing"#;
    let fault = RemoteFault::from_message(msg);
    assert_eq!(friendly_message(&fault, None), "No se pudo guardar: Line \"one\" and two");
  }

  #[test]
  fn domain_marker_trims_leading_noise() {
    let fault = RemoteFault::from_message("0x80070005 El elemento no existe. Es posible que otro usuario lo haya eliminado.");
    assert_eq!(
      friendly_message(&fault, None),
      "No se pudo guardar: El elemento no existe. Es posible que otro usuario lo haya eliminado."
    );
  }

  #[test]
  fn status_text_is_last_resort() {
    let fault = RemoteFault::default().with_status_text("Service Unavailable");
    assert_eq!(friendly_message(&fault, None), "No se pudo guardar: Service Unavailable");
  }

  #[test]
  fn validation_errors_pass_through() {
    let err = FormError::validation("Documento es obligatorio.");
    assert_eq!(describe(&err, None), "Documento es obligatorio.");
    let err = FormError::integrity("No existe persona con ese Documento.");
    assert_eq!(describe(&err, None), "No se pudo guardar: No existe persona con ese Documento.");
  }
}
