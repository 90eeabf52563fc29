//! Path resolution for bankflow configuration.
//!
//! ```text
//! ./settings.toml                    # picked up first when present
//! ~/.config/bankflow/settings.toml   # user-wide fallback
//! ```

use std::path::{Path, PathBuf};

const APP_DIR: &str = "bankflow";
const SETTINGS_FILE: &str = "settings.toml";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct BankflowPaths;

impl BankflowPaths {
    /// Returns the user config directory, e.g. `~/.config/bankflow/`.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the user-wide settings file path.
    pub fn user_settings_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(SETTINGS_FILE))
    }

    /// Settings file candidates, in lookup order, relative to `working_dir`.
    pub fn settings_candidates(working_dir: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![working_dir.join(SETTINGS_FILE)];
        if let Ok(user_file) = Self::user_settings_file() {
            candidates.push(user_file);
        }
        candidates
    }
}
