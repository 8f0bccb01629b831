//! Query model for list reads: `select → filter → orderBy → top`.
//!
//! Filters are built as a small expression tree and rendered to the store's
//! textual predicate syntax (`Title eq 'O''Brien' and activo eq 1`) through
//! [`std::fmt::Display`]. Backends may either send that text as-is or compile
//! the tree into their own query language.

use std::fmt;

// ─── Values ──────────────────────────────────────────────────────────────────

/// A literal on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
  Text(String),
  Int(i64),
  Bool(bool),
}

impl From<&str> for FilterValue {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for FilterValue {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<i64> for FilterValue {
  fn from(n: i64) -> Self { Self::Int(n) }
}

impl From<bool> for FilterValue {
  fn from(b: bool) -> Self { Self::Bool(b) }
}

/// Double every embedded single quote so `s` can sit inside a quoted literal.
pub fn escape_literal(s: &str) -> String { s.replace('\'', "''") }

impl fmt::Display for FilterValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Text(s) => write!(f, "'{}'", escape_literal(s)),
      Self::Int(n) => write!(f, "{n}"),
      Self::Bool(b) => write!(f, "{}", u8::from(*b)),
    }
  }
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// A predicate over list item fields.
///
/// `field` may name a lookup projection such as `Usuarios/Id`, which matches
/// when any of the looked-up ids equals the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
  Eq { field: String, value: FilterValue },
  And(Box<Filter>, Box<Filter>),
}

impl Filter {
  pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
    Self::Eq { field: field.into(), value: value.into() }
  }

  pub fn and(self, other: Filter) -> Self { Self::And(Box::new(self), Box::new(other)) }
}

impl fmt::Display for Filter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Eq { field, value } => write!(f, "{field} eq {value}"),
      Self::And(a, b) => write!(f, "{a} and {b}"),
    }
  }
}

// ─── ListQuery ───────────────────────────────────────────────────────────────

/// Sort direction for [`ListQuery::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
  Ascending,
  Descending,
}

/// Parameters for [`crate::store::ListStore::query`].
///
/// An empty `select` returns every field. `Id` is always returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
  pub select:   Vec<String>,
  pub filter:   Option<Filter>,
  pub order_by: Option<(String, Order)>,
  pub top:      Option<usize>,
}

impl ListQuery {
  pub fn new() -> Self { Self::default() }

  pub fn select<I, S>(mut self, fields: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.select = fields.into_iter().map(Into::into).collect();
    self
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filter = Some(filter);
    self
  }

  pub fn order_by(mut self, field: impl Into<String>, order: Order) -> Self {
    self.order_by = Some((field.into(), order));
    self
  }

  pub fn top(mut self, n: usize) -> Self {
    self.top = Some(n);
    self
  }
}
