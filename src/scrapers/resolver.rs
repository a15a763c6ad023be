//! Dataset resolution: stub link -> listing page -> resource page -> Dataset.

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use super::config::PortalConfig;
use super::http_client::{FetchFailure, PageFetcher};
use super::parser::{PageParser, ParseError};
use crate::models::Dataset;

/// Error types for dataset resolution. Each one drops a single stub.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("fetching {url} failed: {failure}")]
    Fetch {
        url: String,
        #[source]
        failure: FetchFailure,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("resource URL {0} does not match <prefix>/<marker>/<name>/resource/<id>")]
    UnexpectedUrlShape(String),
    #[error("invalid link '{link}': {source}")]
    InvalidUrl {
        link: String,
        #[source]
        source: url::ParseError,
    },
}

/// Derive a dataset name from a resource URL.
///
/// The URL path must contain `<marker>/<name>/resource/...`, where `marker`
/// is the last segment of the portal's dataset path (`dataset` on CKAN
/// portals). Returns `None` for any other shape.
pub fn dataset_name_from_url(url: &Url, marker: &str) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.collect();

    segments.windows(3).find_map(|window| match window {
        [m, name, "resource"] if *m == marker && !name.is_empty() => Some(name.to_string()),
        _ => None,
    })
}

/// Resolves dataset stubs into full datasets.
pub struct DatasetResolver<'a> {
    fetcher: &'a dyn PageFetcher,
    parser: &'a PageParser,
    config: &'a PortalConfig,
    base: &'a Url,
}

impl<'a> DatasetResolver<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        parser: &'a PageParser,
        config: &'a PortalConfig,
        base: &'a Url,
    ) -> Self {
        Self {
            fetcher,
            parser,
            config,
            base,
        }
    }

    /// Resolve one stub link.
    pub async fn resolve(&self, stub_link: &str) -> Result<Dataset, ResolveError> {
        let stub_url = self.join(stub_link)?;
        let stub_page = self.fetch_text(stub_url.as_str()).await?;

        let resource_link = self.parser.extract_resource_link(&stub_page)?;
        let resource_url = self.join(&resource_link)?;
        let name = dataset_name_from_url(&resource_url, self.dataset_marker())
            .ok_or_else(|| ResolveError::UnexpectedUrlShape(resource_url.to_string()))?;
        debug!("Stub {} resolved to dataset name {}", stub_link, name);

        let canonical_url = self.config.canonical_dataset_url(&name);
        let detail_page = self.fetch_text(&canonical_url).await?;

        let tags = self.parser.extract_tags(&detail_page);
        let download_link = self.parser.extract_download_link(&detail_page)?;

        let dataset = Dataset::new(name, canonical_url, download_link).with_tags(tags);
        info!(
            "Resolved dataset {} ({} tags) -> {}",
            dataset.name,
            dataset.tags.len(),
            dataset.download_link
        );
        Ok(dataset)
    }

    fn dataset_marker(&self) -> &str {
        self.config
            .dataset_path
            .trim_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("dataset")
    }

    fn join(&self, link: &str) -> Result<Url, ResolveError> {
        self.base.join(link).map_err(|source| ResolveError::InvalidUrl {
            link: link.to_string(),
            source,
        })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, ResolveError> {
        self.fetcher
            .fetch(url)
            .await
            .into_text()
            .map_err(|failure| ResolveError::Fetch {
                url: url.to_string(),
                failure,
            })
    }
}
