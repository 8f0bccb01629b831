//! Core types and trait definitions for the Roster personnel registry.
//!
//! This crate is deliberately free of storage and presentation dependencies.
//! The remote list store, the identity provider and the hosting form are all
//! reached through the traits in [`store`].

pub mod date_policy;
pub mod document;
pub mod error;
pub mod fault;
pub mod item;
pub mod person;
pub mod provider;
pub mod query;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
