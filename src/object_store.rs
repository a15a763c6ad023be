//! Object storage for the read API.
//!
//! Objects are addressed by `/`-separated keys inside a named bucket. The
//! local implementation maps a bucket to a directory, so converted files can
//! be served straight from disk.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error types for object storage access.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Listing entry for one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

/// Fetch-by-key object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// All objects whose key starts with `prefix`, sorted by key.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError>;
}

/// Bucket backed by `<root>/<bucket>` on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    bucket_dir: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl AsRef<Path>, bucket: &str) -> Self {
        Self {
            bucket_dir: root.as_ref().join(bucket),
        }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.bucket_dir.join(relative))
    }

    /// Deepest directory that can hold keys starting with `prefix`: the part
    /// of the prefix before its last `/`.
    fn listing_root(&self, prefix: &str) -> Result<PathBuf, StoreError> {
        match prefix.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => self.object_path(dir),
            _ => Ok(self.bucket_dir.clone()),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError> {
        let root = self.listing_root(prefix)?;
        match tokio::fs::metadata(&root).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Ok(Vec::new()),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        }

        let mut objects = Vec::new();
        let mut pending = vec![root];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                let path = entry.path();
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Some(key) = object_key(&self.bucket_dir, &path) else {
                    continue;
                };
                if !key.starts_with(prefix) {
                    continue;
                }

                objects.push(ObjectMeta {
                    last_modified: last_modified(&key, metadata.modified())?,
                    key,
                    size: metadata.len(),
                });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

fn last_modified(
    key: &str,
    modified: std::io::Result<SystemTime>,
) -> Result<DateTime<Utc>, StoreError> {
    modified.map(DateTime::<Utc>::from).map_err(|e| {
        tracing::warn!("No modification time for {}: {}", key, e);
        StoreError::Io(e)
    })
}

fn object_key(bucket_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(bucket_dir).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}
