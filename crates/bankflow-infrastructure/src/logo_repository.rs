//! Loads the bank logo lookup table from disk.

use bankflow_core::bank::LogoTable;
use bankflow_core::error::Result;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Reads the logo table file on every call, so edits are picked up without a restart.
#[derive(Debug, Clone)]
pub struct FileLogoRepository {
    path: PathBuf,
}

impl FileLogoRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the table; a missing file yields an empty table so every bank gets
    /// the default logo.
    pub async fn load(&self) -> Result<LogoTable> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(LogoTable::parse(&content)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    "Logo table not found at {}, using default logos",
                    self.path.display()
                );
                Ok(LogoTable::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}
