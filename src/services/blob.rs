use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncWriteExt};

/// Metadata for one stored file.
#[derive(Debug, Clone)]
pub struct BlobInfo {
    pub name: String,
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
}

pub struct BlobReader {
    pub size: u64,
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
}

/// Storage for uploaded files, addressed by slash-separated keys such as
/// `avatars/avatar-<id>-<ts>.png`. Services only see keys, never paths.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
    /// Best effort: a missing blob is not an error. Returns whether something was removed.
    async fn delete(&self, key: &str) -> Result<bool>;
    async fn open(&self, key: &str) -> Result<Option<BlobReader>>;
    /// Top-level blobs, creating the backing location if needed.
    async fn list(&self) -> Result<Vec<BlobInfo>>;
    /// Human-readable location for diagnostics.
    fn location(&self) -> String;
}

/// Keys must be relative and free of `..`, so a key can never escape the root.
pub fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && !key.contains('\\')
        && Path::new(key)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Blob store rooted at a local directory (`uploads/` by default).
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

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if !is_safe_key(key) {
            anyhow::bail!("Invalid blob key: {}", key);
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(bytes).await?;
        file.flush().await?;
        tracing::info!("File saved to: {}", path.display());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!("File removed: {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    async fn open(&self, key: &str) -> Result<Option<BlobReader>> {
        let Ok(path) = self.path_for(key) else {
            return Ok(None);
        };
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Ok(None);
        }
        Ok(Some(BlobReader {
            size: metadata.len(),
            reader: Box::new(file),
        }))
    }

    async fn list(&self) -> Result<Vec<BlobInfo>> {
        tokio::fs::create_dir_all(&self.root).await?;

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut blobs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            blobs.push(BlobInfo {
                name: entry.file_name().to_string_lossy().to_string(),
                size: metadata.len(),
                created: metadata.created().ok().map(DateTime::<Utc>::from),
            });
        }
        blobs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(blobs)
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}
