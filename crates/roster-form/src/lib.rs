//! The personnel registration form, independent of any rendering layer.
//!
//! [`FormController`] owns all in-memory form state and drives a
//! [`roster_core::store::ListStore`]: it registers, modifies and deactivates
//! people together with their five documentation rows. The host renders
//! [`FormView`] snapshots and feeds user input back as method calls.

pub mod best_effort;
pub mod config;
pub mod controller;
pub mod documents;
pub mod edit;
pub mod error;
pub mod load;
pub mod provider;
pub mod reconcile;
pub mod translate;
pub mod view;

pub use best_effort::BestEffort;
pub use config::HostConfig;
pub use controller::{FormController, Mode, MountReport, SaveOutcome};
pub use edit::FormEdit;
pub use error::FormError;
pub use view::FormView;

#[cfg(test)]
mod tests;
