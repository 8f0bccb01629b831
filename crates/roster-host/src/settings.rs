//! Host settings: an optional TOML file overlaid with `ROSTER_*` variables.
//!
//! Nested keys use a double underscore, e.g. `ROSTER_HOST__LOCK_PROVIDER=true`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use roster_form::HostConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite file backing the lists.
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// Id reported as the signed-in user. Provider detection needs it.
  #[serde(default)]
  pub current_user_id: Option<i64>,
  /// Provision the provider relationship as a multi-valued lookup.
  #[serde(default)]
  pub multi_provider:  bool,
  #[serde(default)]
  pub host:            HostConfig,
}

fn default_store_path() -> PathBuf { PathBuf::from("roster.db") }

impl Settings {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("ROSTER")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise Settings")
  }
}
