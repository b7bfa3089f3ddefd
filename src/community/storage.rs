use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use super::{BlobStorage, RemoteError};

/// Blob storage in a local directory. Download URLs are `file://` URLs.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a storage path under the root. Absolute paths and `..` are refused.
    fn resolve(&self, path: &str) -> Result<PathBuf, RemoteError> {
        let relative = Path::new(path);
        let clean = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || !clean {
            return Err(RemoteError::new(format!("Invalid storage path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStorage for DirectoryStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), RemoteError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RemoteError::new(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| RemoteError::new(format!("Failed to write {}: {}", target.display(), e)))?;
        tracing::debug!(path = %target.display(), content_type, size = bytes.len(), "blob stored");
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String, RemoteError> {
        let target = self.resolve(path)?;
        let absolute = tokio::fs::canonicalize(&target)
            .await
            .map_err(|e| RemoteError::new(format!("No such file {}: {}", path, e)))?;
        Ok(format!("file://{}", absolute.display()))
    }
}
