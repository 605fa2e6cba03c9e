//! Blob storage port and the local-filesystem implementation.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::CoreError;

/// File storage addressed by relative, `/`-separated paths.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// `true` if a file is stored at `path`.
    async fn exists(&self, path: &str) -> Result<bool, CoreError>;

    /// Read the whole file. Fails with [`CoreError::FileNotFound`] when absent.
    async fn read(&self, path: &str) -> Result<Vec<u8>, CoreError>;

    /// Create or replace the file at `path`, creating directories as needed.
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), CoreError>;

    /// Remove the file at `path`. Returns `false` if there was nothing to remove.
    async fn delete(&self, path: &str) -> Result<bool, CoreError>;
}

/// [`BlobStore`] backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create `dirs` (relative to the root) if they do not exist yet.
    pub async fn ensure_dirs(&self, dirs: &[&str]) -> Result<(), CoreError> {
        for dir in dirs {
            let full = self.resolve(dir)?;
            tokio::fs::create_dir_all(&full)
                .await
                .map_err(|e| storage_error(&full, e))?;
        }
        Ok(())
    }

    /// Map a stored path onto the filesystem, refusing anything that could
    /// leave the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, CoreError> {
        if path.trim().is_empty() {
            return Err(CoreError::InvalidReference(
                "file reference is empty".to_string(),
            ));
        }
        let relative = Path::new(path);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(CoreError::InvalidReference(format!(
                        "'{path}' is not a path inside the media root"
                    )))
                }
            }
        }
        Ok(self.root.join(relative))
    }
}

fn storage_error(path: &Path, err: std::io::Error) -> CoreError {
    CoreError::Storage(format!("{}: {err}", path.display()))
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn exists(&self, path: &str) -> Result<bool, CoreError> {
        let full = self.resolve(path)?;
        tokio::fs::try_exists(&full)
            .await
            .map_err(|e| storage_error(&full, e))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, CoreError> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => CoreError::FileNotFound(path.to_string()),
            _ => storage_error(&full, e),
        })
    }

    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), CoreError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(parent, e))?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| storage_error(&full, e))
    }

    async fn delete(&self, path: &str) -> Result<bool, CoreError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_error(&full, e)),
        }
    }
}
