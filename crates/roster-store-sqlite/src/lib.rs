//! SQLite backend for the Roster list store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every list lives in one `items` table
//! as a JSON field map; filters are compiled to `json_each` lookups.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::FieldDefinition;
pub use store::SqliteStore;
