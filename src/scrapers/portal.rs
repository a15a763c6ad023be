//! Crawl orchestration: theme index -> listing pages -> datasets -> storage.
//!
//! Everything runs as a sequence of awaits on the caller's task, one request
//! at a time.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use super::config::PortalConfig;
use super::http_client::{FetchFailure, PageFetcher};
use super::pagination::{ListingState, Paginator};
use super::parser::{PageParser, ParseError};
use super::policy::FailurePolicy;
use super::resolver::DatasetResolver;
use crate::models::Theme;
use crate::storage::DatasetSink;

/// Errors that end a crawl run.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("theme index {url} could not be fetched: {failure}")]
    ThemeDiscovery {
        url: String,
        #[source]
        failure: FetchFailure,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid portal URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("skipping failed listing pages needs max_pages, or a failing listing never ends")]
    UnboundedListingSkip,
}

/// Per-theme crawl statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeReport {
    pub theme: String,
    /// Listing page numbers that yielded datasets, in fetch order.
    pub pages: Vec<u32>,
    pub state: ListingState,
    pub resolved: usize,
    pub skipped: usize,
    pub persisted: usize,
    pub persist_failures: usize,
}

impl ThemeReport {
    fn new(theme: &str) -> Self {
        Self {
            theme: theme.to_string(),
            pages: Vec::new(),
            state: ListingState::Listing(1),
            resolved: 0,
            skipped: 0,
            persisted: 0,
            persist_failures: 0,
        }
    }
}

/// Outcome of a full crawl run.
#[derive(Debug, Default)]
pub struct CrawlSummary {
    pub themes: Vec<Theme>,
    pub reports: Vec<ThemeReport>,
}

impl CrawlSummary {
    pub fn dataset_count(&self) -> usize {
        self.themes.iter().map(Theme::dataset_count).sum()
    }
}

/// Crawler for one portal.
pub struct PortalCrawler {
    fetcher: Arc<dyn PageFetcher>,
    sink: Option<Arc<dyn DatasetSink>>,
    parser: PageParser,
    config: PortalConfig,
    base: Url,
}

impl PortalCrawler {
    pub fn new(config: PortalConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self, CrawlError> {
        if config.policies.listing_page == FailurePolicy::SkipItem && config.max_pages.is_none() {
            return Err(CrawlError::UnboundedListingSkip);
        }
        let base = Url::parse(&config.base_url)?;
        let parser = PageParser::new(&config.selectors)?;
        Ok(Self {
            fetcher,
            sink: None,
            parser,
            config,
            base,
        })
    }

    /// Persist every resolved dataset through `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn DatasetSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Fetch the theme index and build one empty theme per entry.
    pub async fn discover_themes(&self) -> Result<Vec<Theme>, CrawlError> {
        let url = self.base.join(&self.config.themes_path)?;
        let html = self
            .fetcher
            .fetch(url.as_str())
            .await
            .into_text()
            .map_err(|failure| CrawlError::ThemeDiscovery {
                url: url.to_string(),
                failure,
            })?;

        let themes: Vec<Theme> = self
            .parser
            .extract_themes(&html)?
            .into_iter()
            .map(|entry| Theme::new(entry.name, entry.listing_path))
            .collect();
        info!("Discovered {} themes at {}", themes.len(), url);
        Ok(themes)
    }

    /// Enumerate one theme's listing, resolving and persisting each stub.
    pub async fn crawl_theme(&self, theme: &mut Theme) -> ThemeReport {
        let mut report = ThemeReport::new(&theme.name);

        let listing_url = match self.base.join(&theme.listing_path) {
            Ok(url) => url,
            Err(e) => {
                warn!(
                    "Theme {} has invalid listing path {}: {}",
                    theme.name, theme.listing_path, e
                );
                report.state = ListingState::Aborted;
                return report;
            }
        };

        let resolver = DatasetResolver::new(
            self.fetcher.as_ref(),
            &self.parser,
            &self.config,
            &self.base,
        );
        let mut paginator = Paginator::new(
            self.fetcher.as_ref(),
            &self.parser,
            &self.config,
            listing_url,
        );

        let policies = self.config.policies;
        let mut stopped = false;
        'pages: while let Some(page) = paginator.next_page().await {
            report.pages.push(page.number);

            for stub in &page.stubs {
                let dataset = match resolver.resolve(stub).await {
                    Ok(dataset) => dataset,
                    Err(e) => {
                        warn!(
                            "Stub {} in {} failed: {} (policy {})",
                            stub, theme.name, e, policies.stub_resolution
                        );
                        report.skipped += 1;
                        match policies.stub_resolution {
                            FailurePolicy::SkipItem => continue,
                            FailurePolicy::AbortEnumeration => {
                                stopped = true;
                                break 'pages;
                            }
                        }
                    }
                };

                let mut persist_failed = false;
                if let Some(sink) = &self.sink {
                    match sink.persist(&dataset, &theme.name).await {
                        Ok(_) => report.persisted += 1,
                        Err(e) => {
                            warn!(
                                "Could not persist {} in {}: {} (policy {})",
                                dataset.name, theme.name, e, policies.persistence
                            );
                            report.persist_failures += 1;
                            persist_failed = true;
                        }
                    }
                }

                theme.add_dataset(dataset);
                report.resolved += 1;

                if persist_failed && policies.persistence == FailurePolicy::AbortEnumeration {
                    stopped = true;
                    break 'pages;
                }
            }
        }

        report.state = if stopped {
            ListingState::Aborted
        } else {
            paginator.state()
        };
        info!(
            "Theme {} {}: {} datasets over {} pages, {} skipped",
            theme.name,
            report.state,
            report.resolved,
            report.pages.len(),
            report.skipped
        );
        report
    }

    /// Discover themes and crawl them in index order.
    ///
    /// A non-empty `only` restricts the run to themes whose names match one
    /// of its entries, case-insensitively.
    pub async fn run(&self, only: &[String]) -> Result<CrawlSummary, CrawlError> {
        let mut themes = self.discover_themes().await?;
        if !only.is_empty() {
            themes.retain(|theme| only.iter().any(|name| theme.matches_name(name)));
            if themes.is_empty() {
                warn!("No theme matched {:?}", only);
            }
        }

        let mut summary = CrawlSummary::default();
        for mut theme in themes {
            let report = self.crawl_theme(&mut theme).await;
            summary.reports.push(report);
            summary.themes.push(theme);
        }

        info!(
            "Crawl finished: {} themes, {} datasets",
            summary.themes.len(),
            summary.dataset_count()
        );
        Ok(summary)
    }
}
