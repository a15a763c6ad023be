//! Listing pagination for one theme.
//!
//! Pages are requested as `<listing>?<page_param>=n` starting at 1. A page
//! with no dataset items ends the listing. A failed fetch aborts it or skips
//! to the next page, per the listing-page policy.

use std::fmt;

use tracing::{debug, info, warn};
use url::Url;

use super::config::PortalConfig;
use super::http_client::PageFetcher;
use super::parser::PageParser;
use super::policy::FailurePolicy;

/// Where a theme's listing enumeration stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingState {
    /// Page `n` is the next one to fetch.
    Listing(u32),
    /// An empty page (or the page ceiling) was reached.
    Done,
    /// A listing page could not be fetched.
    Aborted,
}

impl fmt::Display for ListingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listing(n) => write!(f, "listing page {}", n),
            Self::Done => f.write_str("done"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

/// One non-empty listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub number: u32,
    pub url: String,
    pub stubs: Vec<String>,
}

/// Drives `Listing(1) -> ... -> Done | Aborted` for a single theme.
pub struct Paginator<'a> {
    fetcher: &'a dyn PageFetcher,
    parser: &'a PageParser,
    listing_url: Url,
    page_param: &'a str,
    max_pages: Option<u32>,
    on_failure: FailurePolicy,
    state: ListingState,
}

impl<'a> Paginator<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        parser: &'a PageParser,
        config: &'a PortalConfig,
        listing_url: Url,
    ) -> Self {
        Self {
            fetcher,
            parser,
            listing_url,
            page_param: &config.page_param,
            max_pages: config.max_pages,
            on_failure: config.policies.listing_page,
            state: ListingState::Listing(1),
        }
    }

    pub fn state(&self) -> ListingState {
        self.state
    }

    /// URL of listing page `n`. Any page parameter already present on the
    /// listing URL is replaced.
    pub fn page_url(&self, n: u32) -> String {
        let kept: Vec<(String, String)> = self
            .listing_url
            .query_pairs()
            .filter(|(key, _)| key != self.page_param)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut url = self.listing_url.clone();
        url.set_query(None);
        url.query_pairs_mut()
            .extend_pairs(kept)
            .append_pair(self.page_param, &n.to_string());
        url.to_string()
    }

    /// Fetch the next page and advance the state.
    ///
    /// Returns `None` once the listing is finished; the final state tells
    /// whether it ended normally or was aborted.
    pub async fn next_page(&mut self) -> Option<ListingPage> {
        loop {
            let ListingState::Listing(n) = self.state else {
                return None;
            };

            if self.max_pages.is_some_and(|max| n > max) {
                info!("Page ceiling reached before page {} of {}", n, self.listing_url);
                self.state = ListingState::Done;
                return None;
            }

            let url = self.page_url(n);
            let html = match self.fetcher.fetch(&url).await.into_text() {
                Ok(html) => html,
                Err(failure) => {
                    warn!(
                        "Listing page {} failed ({}), policy {}",
                        url, failure, self.on_failure
                    );
                    match self.on_failure {
                        FailurePolicy::AbortEnumeration => {
                            self.state = ListingState::Aborted;
                            return None;
                        }
                        FailurePolicy::SkipItem => {
                            self.state = ListingState::Listing(n + 1);
                            continue;
                        }
                    }
                }
            };

            let stubs = self.parser.extract_dataset_stubs(&html);
            if stubs.is_empty() {
                debug!("Listing page {} is empty", url);
                self.state = ListingState::Done;
                return None;
            }

            debug!("Listing page {} has {} datasets", url, stubs.len());
            self.state = ListingState::Listing(n + 1);
            return Some(ListingPage {
                number: n,
                url,
                stubs,
            });
        }
    }
}
