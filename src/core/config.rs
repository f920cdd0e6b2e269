//! Blast configuration (blast.toml) parsing
//!
//! The config file is optional; every field has a CLI counterpart that wins
//! when both are present. Searched at the workspace root only.

use crate::core::error::{BlastError, BlastResult, ConfigError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// File name searched at the workspace root
pub const CONFIG_FILE: &str = "blast.toml";

/// Configuration for blast
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlastConfig {
  /// Base revision to compare against (CLI --base wins)
  #[serde(default)]
  pub base: Option<String>,

  /// Folders excluded from source indexing and textual search
  #[serde(default)]
  pub ignored_paths: Option<Vec<String>>,

  /// Extra always-include patterns (literal suffixes or regexes)
  #[serde(default)]
  pub include_files: Vec<String>,

  /// Enable the lockfile delta check (CLI --lockfile-check wins)
  #[serde(default)]
  pub lockfile_check: Option<bool>,
}

impl BlastConfig {
  /// Load blast.toml from the workspace root.
  ///
  /// A missing file yields the default config; a present but malformed file
  /// is a user error naming the file.
  pub fn load(workspace_root: &Path) -> BlastResult<Self> {
    let path = workspace_root.join(CONFIG_FILE);

    if !path.exists() {
      return Ok(Self::default());
    }

    let content = fs::read_to_string(&path)?;
    toml_edit::de::from_str(&content).map_err(|e| {
      BlastError::Config(ConfigError::Invalid {
        path,
        reason: e.to_string(),
      })
    })
  }
}

/// Default folders excluded from indexing and textual search
pub fn default_ignored_paths() -> Vec<String> {
  vec![
    "node_modules".to_string(),
    "dist".to_string(),
    "build".to_string(),
    ".git".to_string(),
  ]
}
