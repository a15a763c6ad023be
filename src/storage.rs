//! Storage helpers for downloaded dataset files.
//!
//! Files land at `<data_dir>/<theme>/<dataset>.<ext>`, overwriting any
//! previous download of the same dataset.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::models::Dataset;
use crate::scrapers::{FetchFailure, PageFetcher};

/// Error types for dataset persistence.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("downloading {url} failed: {failure}")]
    Fetch {
        url: String,
        #[source]
        failure: FetchFailure,
    },
    #[error("download link '{0}' has no file extension")]
    MissingExtension(String),
    #[error("invalid download link '{link}': {source}")]
    InvalidUrl {
        link: String,
        #[source]
        source: url::ParseError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for resolved datasets.
#[async_trait]
pub trait DatasetSink: Send + Sync {
    /// Store one dataset under its theme and return where it went.
    async fn persist(&self, dataset: &Dataset, theme_name: &str) -> Result<PathBuf, PersistError>;
}

/// Extension from the trailing path suffix of a link, taken verbatim.
///
/// Query strings and fragments are ignored. Returns `None` when the last
/// path segment has no `.` or ends with one.
pub fn extension_from_link(link: &str) -> Option<&str> {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    let file_name = path.rsplit('/').next()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

/// Make a theme or dataset name safe to use as one path component.
pub fn sanitize_path_component(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match sanitized.trim() {
        "" | "." | ".." => "_".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// `<data_dir>/<theme>/<dataset>.<ext>`
pub fn dataset_storage_path(
    data_dir: &Path,
    theme_name: &str,
    dataset_name: &str,
    ext: &str,
) -> PathBuf {
    data_dir
        .join(sanitize_path_component(theme_name))
        .join(format!("{}.{}", sanitize_path_component(dataset_name), ext))
}

/// Downloads dataset files into the theme-partitioned data directory.
pub struct DatasetWriter {
    fetcher: Arc<dyn PageFetcher>,
    base_url: Url,
    data_dir: PathBuf,
}

impl DatasetWriter {
    /// `base_url` resolves relative download links.
    pub fn new(fetcher: Arc<dyn PageFetcher>, base_url: Url, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            base_url,
            data_dir: data_dir.into(),
        }
    }
}

#[async_trait]
impl DatasetSink for DatasetWriter {
    async fn persist(&self, dataset: &Dataset, theme_name: &str) -> Result<PathBuf, PersistError> {
        let link = &dataset.download_link;
        let url = self.base_url.join(link).map_err(|source| PersistError::InvalidUrl {
            link: link.clone(),
            source,
        })?;
        let ext = extension_from_link(url.path())
            .ok_or_else(|| PersistError::MissingExtension(link.clone()))?;

        let path = dataset_storage_path(&self.data_dir, theme_name, &dataset.name, ext);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = self
            .fetcher
            .fetch(url.as_str())
            .await
            .into_bytes()
            .map_err(|failure| PersistError::Fetch {
                url: url.to_string(),
                failure,
            })?;

        tokio::fs::write(&path, &content).await?;
        info!("Saved {} ({} bytes)", path.display(), content.len());

        Ok(path)
    }
}
