//! In-memory test doubles for the crawl pipeline.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::Dataset;
use crate::scrapers::{FetchFailure, FetchOutcome, PageFetcher};
use crate::storage::{DatasetSink, PersistError};

/// Serves canned outcomes by exact URL and records every request.
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, FetchOutcome>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, html: &str) -> Self {
        self.bytes(url, html.as_bytes())
    }

    pub fn bytes(mut self, url: &str, body: &[u8]) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchOutcome::Success {
                body: body.to_vec(),
                status: 200,
            },
        );
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchOutcome::Failure(FetchFailure::Status(status)),
        );
        self
    }

    pub fn transport_error(mut self, url: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchOutcome::Failure(FetchFailure::Transport("connection refused".to_string())),
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .unwrap_or(FetchOutcome::Failure(FetchFailure::Status(404)))
    }
}

/// Records `(theme, dataset)` pairs instead of writing files.
#[derive(Default)]
pub struct RecordingSink {
    persisted: Mutex<Vec<(String, String)>>,
    failing: HashSet<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make persisting the named dataset fail.
    pub fn failing_on(mut self, dataset_name: &str) -> Self {
        self.failing.insert(dataset_name.to_string());
        self
    }

    pub fn persisted(&self) -> Vec<(String, String)> {
        self.persisted.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatasetSink for RecordingSink {
    async fn persist(&self, dataset: &Dataset, theme_name: &str) -> Result<PathBuf, PersistError> {
        if self.failing.contains(&dataset.name) {
            return Err(PersistError::MissingExtension(dataset.download_link.clone()));
        }
        self.persisted
            .lock()
            .unwrap()
            .push((theme_name.to_string(), dataset.name.clone()));
        Ok(PathBuf::from(theme_name).join(&dataset.name))
    }
}
