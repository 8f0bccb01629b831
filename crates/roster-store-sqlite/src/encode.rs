//! Encoding helpers between the list-store model and SQLite.
//!
//! Field maps are stored as compact JSON objects. Filters compile to
//! `json_each` lookups so that single and multi-valued columns share one
//! equality test. Timestamps are RFC 3339 strings.

use chrono::{DateTime, Utc};
use roster_core::{
  item::{Fields, Item},
  query::{Filter, FilterValue, ListQuery, Order},
  schema::ID,
};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

// ─── Field names ─────────────────────────────────────────────────────────────

/// Resolve a field reference to the stored column name.
///
/// A lookup projection `Users/Id` reads the flat id column `UsersId`.
pub fn column_name(field: &str) -> Result<String> {
  let column = match field.split_once('/') {
    Some((lookup, "Id")) => format!("{lookup}Id"),
    Some(_) => return Err(Error::InvalidFieldName(field.to_owned())),
    None => field.to_owned(),
  };
  let valid = !column.is_empty()
    && column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
  if valid { Ok(column) } else { Err(Error::InvalidFieldName(field.to_owned())) }
}

/// JSON path for a stored column name.
pub fn json_path(column: &str) -> String { format!("$.\"{column}\"") }

// ─── Values ──────────────────────────────────────────────────────────────────

pub fn filter_value(v: &FilterValue) -> SqlValue {
  match v {
    FilterValue::Text(s) => SqlValue::Text(s.clone()),
    FilterValue::Int(n) => SqlValue::Integer(*n),
    FilterValue::Bool(b) => SqlValue::Integer(i64::from(*b)),
  }
}

/// SQL value comparable with `json_extract` output; `None` for null and
/// structured values.
pub fn scalar_value(v: &Value) -> Option<SqlValue> {
  match v {
    Value::String(s) => Some(SqlValue::Text(s.clone())),
    Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
    Value::Number(n) => n
      .as_i64()
      .map(SqlValue::Integer)
      .or_else(|| n.as_f64().map(SqlValue::Real)),
    _ => None,
  }
}

/// Flatten `{"results": [..]}` collection payloads into plain arrays.
pub fn normalize_fields(fields: Fields) -> Fields {
  fields
    .into_iter()
    .map(|(k, v)| {
      let v = match v {
        Value::Object(mut obj) if obj.len() == 1 && obj.contains_key("results") => {
          obj.remove("results").unwrap_or(Value::Null)
        }
        other => other,
      };
      (k, v)
    })
    .collect()
}

/// Keep only the selected columns. An empty selection keeps everything.
pub fn project(fields: Fields, select: &[String]) -> Fields {
  if select.is_empty() {
    return fields;
  }
  let wanted: Vec<String> = select
    .iter()
    .filter(|s| s.as_str() != ID)
    .filter_map(|s| column_name(s).ok())
    .collect();
  fields.into_iter().filter(|(k, _)| wanted.iter().any(|w| w == k)).collect()
}

// ─── Query compilation ───────────────────────────────────────────────────────

/// A `SELECT` over `items` with its positional parameters.
pub struct CompiledQuery {
  pub sql:    String,
  pub params: Vec<SqlValue>,
}

fn compile_filter(filter: &Filter, params: &mut Vec<SqlValue>) -> Result<String> {
  match filter {
    Filter::Eq { field, value } if field == ID => {
      params.push(filter_value(value));
      Ok(format!("items.item_id = ?{}", params.len()))
    }
    Filter::Eq { field, value } => {
      params.push(SqlValue::Text(json_path(&column_name(field)?)));
      let path_idx = params.len();
      params.push(filter_value(value));
      let value_idx = params.len();
      Ok(format!(
        "EXISTS (SELECT 1 FROM json_each(items.fields, ?{path_idx}) AS je \
         WHERE je.value = ?{value_idx})"
      ))
    }
    Filter::And(a, b) => {
      let a = compile_filter(a, params)?;
      let b = compile_filter(b, params)?;
      Ok(format!("({a}) AND ({b})"))
    }
  }
}

pub fn compile_query(list: &str, query: &ListQuery) -> Result<CompiledQuery> {
  let mut params = vec![SqlValue::Text(list.to_owned())];
  let mut sql = String::from("SELECT items.item_id, items.fields FROM items WHERE items.list = ?1");

  if let Some(filter) = &query.filter {
    let clause = compile_filter(filter, &mut params)?;
    sql.push_str(&format!(" AND {clause}"));
  }

  let direction = |o: Order| match o {
    Order::Ascending => "ASC",
    Order::Descending => "DESC",
  };
  match &query.order_by {
    Some((field, order)) if field == ID => {
      sql.push_str(&format!(" ORDER BY items.item_id {}", direction(*order)));
    }
    Some((field, order)) => {
      params.push(SqlValue::Text(json_path(&column_name(field)?)));
      sql.push_str(&format!(
        " ORDER BY json_extract(items.fields, ?{}) {dir}, items.item_id {dir}",
        params.len(),
        dir = direction(*order),
      ));
    }
    None => sql.push_str(" ORDER BY items.item_id ASC"),
  }

  let limit = query.top.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
  params.push(SqlValue::Integer(limit));
  sql.push_str(&format!(" LIMIT ?{}", params.len()));

  Ok(CompiledQuery { sql, params })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw columns read directly from an `items` row.
pub struct RawItem {
  pub item_id: i64,
  pub fields:  String,
}

impl RawItem {
  pub fn into_item(self, select: &[String]) -> Result<Item> {
    let Value::Object(fields) = serde_json::from_str(&self.fields)? else {
      return Err(Error::NotAnObject);
    };
    Ok(Item::new(self.item_id, project(fields, select)))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn lookup_projection_maps_to_id_column() {
    assert_eq!(column_name("Usuarios/Id").unwrap(), "UsuariosId");
    assert!(column_name("Usuarios/Title").is_err());
    assert!(column_name("a\"b").is_err());
  }

  #[test]
  fn results_payload_flattens() {
    let Value::Object(f) = json!({ "ProveedorId": { "results": [3] }, "Nombre": "Ana" }) else {
      unreachable!()
    };
    let f = normalize_fields(f);
    assert_eq!(f.get("ProveedorId"), Some(&json!([3])));
    assert_eq!(f.get("Nombre"), Some(&json!("Ana")));
  }

  #[test]
  fn compiled_query_numbers_params_in_order() {
    let q = ListQuery::new()
      .filter(Filter::eq("Title", "x").and(Filter::eq("Id", 4_i64)))
      .order_by("Title", Order::Descending)
      .top(1);
    let c = compile_query("Personal", &q).unwrap();
    assert_eq!(c.params.len(), 6);
    assert!(c.sql.contains("items.item_id = ?4"));
    assert!(c.sql.ends_with("LIMIT ?6"));
  }
}
