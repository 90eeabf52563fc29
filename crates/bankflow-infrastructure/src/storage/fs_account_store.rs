//! Directory-backed account data store.
//!
//! Every payload is one pretty-printed JSON file named after its
//! [`StorageKey`]. Writes go through a temporary file and an atomic rename, so a
//! crash never leaves a half-written payload under its final name.

use async_trait::async_trait;
use bankflow_core::account::{AccountDataStore, StorageKey};
use bankflow_core::error::{BankflowError, Result};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct FsAccountDataStore {
    root: PathBuf,
}

impl FsAccountDataStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a download request to a file inside the store directory.
    ///
    /// # Errors
    ///
    /// - `Security` if `file_name` is not a single plain file name, or if the
    ///   resolved file lies outside the store directory (e.g. via a symlink)
    /// - `NotFound` if no such file exists
    pub async fn resolve_download(&self, file_name: &str) -> Result<PathBuf> {
        if !is_plain_file_name(file_name) {
            tracing::warn!("Rejected download name {:?}", file_name);
            return Err(BankflowError::security(format!(
                "invalid download name: {file_name}"
            )));
        }

        let candidate = self.root.join(file_name);
        let resolved = match tokio::fs::canonicalize(&candidate).await {
            Ok(path) => path,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(BankflowError::not_found("download", file_name));
            }
            Err(err) => return Err(err.into()),
        };
        let root = tokio::fs::canonicalize(&self.root).await?;

        if !resolved.starts_with(&root) {
            tracing::warn!("Download {:?} resolves outside the output directory", file_name);
            return Err(BankflowError::security(format!(
                "download escapes output directory: {file_name}"
            )));
        }
        if !resolved.is_file() {
            return Err(BankflowError::not_found("download", file_name));
        }
        Ok(resolved)
    }

    fn path_for(&self, key: &StorageKey) -> Result<PathBuf> {
        let file_name = key.file_name();
        if !is_plain_file_name(&file_name) {
            return Err(BankflowError::security(format!(
                "account id produces an invalid file name: {}",
                key.account_id
            )));
        }
        Ok(self.root.join(file_name))
    }
}

#[async_trait]
impl AccountDataStore for FsAccountDataStore {
    async fn write(&self, key: &StorageKey, payload: &Value) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let content = serde_json::to_vec_pretty(payload)?;

        // Write to temporary file in the same directory
        let tmp_path = self
            .root
            .join(format!(".{}.{}.tmp", key.file_name(), uuid::Uuid::new_v4()));
        let mut tmp_file = tokio::fs::File::create(&tmp_path).await?;
        tmp_file.write_all(&content).await?;
        tmp_file.sync_all().await?;
        drop(tmp_file);

        if let Err(err) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }

        tracing::debug!("Saved {}", path.display());
        Ok(())
    }

    async fn read(&self, key: &StorageKey) -> Result<Option<Value>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// True when `name` is exactly one normal path component.
fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}
