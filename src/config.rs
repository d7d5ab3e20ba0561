//! Runtime configuration.
//!
//! Every field has a default so an empty JSON object is a valid config file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpliceError};

/// Default number of undo steps kept before the oldest is evicted.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Default quiet period before a pending autosave is written.
pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 500;

/// Default directory for stored projects.
pub const DEFAULT_STORAGE_DIR: &str = "projects";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpliceConfig {
    /// Maximum number of undo steps.
    pub history_capacity: usize,

    /// Trailing-edge debounce delay for autosave, in milliseconds.
    pub autosave_delay_ms: u64,

    /// Whether edits are written back through the persistence gateway.
    pub autosave_enabled: bool,

    /// Directory holding `<project-id>.json` files.
    pub storage_dir: PathBuf,

    /// Project to open at startup. `None` opens the most recently saved one.
    pub project_id: Option<String>,
}

impl Default for SpliceConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            autosave_enabled: true,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            project_id: None,
        }
    }
}

impl SpliceConfig {
    /// Read and validate a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SpliceError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: SpliceConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(SpliceError::InvalidConfig {
                reason: "history_capacity must be at least 1".to_string(),
            });
        }
        if self.autosave_delay_ms == 0 {
            return Err(SpliceError::InvalidConfig {
                reason: "autosave_delay_ms must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}
