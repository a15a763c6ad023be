//! Failure policies applied at each crawl call site.
//!
//! Every failure is first-attempt-final. What differs between call sites is
//! how far the failure reaches: the rest of a theme's listing, or just the
//! item being processed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a failure at a given call site affects the crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop enumerating the current theme. Datasets already resolved stay.
    AbortEnumeration,
    /// Drop the current item and continue with the next one.
    SkipItem,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AbortEnumeration => "abort-enumeration",
            Self::SkipItem => "skip-item",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing page `n` could not be fetched.
pub const LISTING_PAGE: FailurePolicy = FailurePolicy::AbortEnumeration;
/// A dataset stub could not be resolved (fetch, structure or URL shape).
pub const STUB_RESOLUTION: FailurePolicy = FailurePolicy::SkipItem;
/// A resolved dataset could not be downloaded or written.
pub const PERSISTENCE: FailurePolicy = FailurePolicy::SkipItem;

/// The policy selected for each call site of a crawl.
///
/// Skipping a failed listing page moves on to the next page number, so a
/// listing that keeps failing only ends at `max_pages`; that combination
/// requires a page ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlPolicies {
    pub listing_page: FailurePolicy,
    pub stub_resolution: FailurePolicy,
    pub persistence: FailurePolicy,
}

impl Default for CrawlPolicies {
    fn default() -> Self {
        Self {
            listing_page: LISTING_PAGE,
            stub_resolution: STUB_RESOLUTION,
            persistence: PERSISTENCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_call_site_policies() {
        let policies = CrawlPolicies::default();
        assert_eq!(policies.listing_page, FailurePolicy::AbortEnumeration);
        assert_eq!(policies.stub_resolution, FailurePolicy::SkipItem);
        assert_eq!(policies.persistence, FailurePolicy::SkipItem);
    }

    #[test]
    fn test_display_matches_config_spelling() {
        assert_eq!(LISTING_PAGE.to_string(), "abort-enumeration");
        assert_eq!(STUB_RESOLUTION.to_string(), "skip-item");

        let policies: CrawlPolicies = toml::from_str(r#"stub_resolution = "abort-enumeration""#)
            .unwrap();
        assert_eq!(policies.stub_resolution, FailurePolicy::AbortEnumeration);
        assert_eq!(policies.listing_page, LISTING_PAGE);
    }
}
