//! File system paths for the journal client.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Manages file system paths for the client.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.wired-journal)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.wired-journal`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".wired-journal"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.wired-journal).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.wired-journal/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the local state directory (~/.wired-journal/state).
    ///
    /// Holds the persisted session and draft blobs, one file per storage key.
    pub fn state_dir(&self) -> PathBuf {
        self.base_dir.join("state")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.state_dir())?;
        Ok(())
    }
}
