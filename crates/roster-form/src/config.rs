//! Settings supplied by the hosting page at render time.

use serde::{Deserialize, Serialize};

/// Host-provided configuration of one form instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
  /// Absolute URL of the site; attachment links are resolved against it.
  pub site_base_url:      String,
  /// Show only the acting provider's people in the grid.
  pub filter_by_provider: bool,
  /// Detect the provider from the signed-in user and forbid changing it.
  pub lock_provider:      bool,
  /// Deactivation deletes the person and all documentation instead of
  /// flagging the person inactive.
  pub hard_delete:        bool,
}
