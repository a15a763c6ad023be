//! Portal configuration types.
//!
//! These structs hold everything that couples the crawler to one portal's
//! markup and URL layout: base URL, listing paths, pagination parameter and
//! the CSS selectors used by the page parser.

use serde::{Deserialize, Serialize};

use super::policy::CrawlPolicies;

/// Portal crawl configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Portal origin, e.g. `https://data.gov.ma`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the theme index page.
    #[serde(default = "default_themes_path")]
    pub themes_path: String,
    /// Path prefix of canonical dataset pages (`<dataset_path>/<name>`).
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,
    /// Query parameter carrying the listing page number.
    #[serde(default = "default_page_param")]
    pub page_param: String,
    /// Hard ceiling on listing pages per theme (None = until an empty page).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    /// Failure policy per crawl call site.
    #[serde(default)]
    pub policies: CrawlPolicies,
    #[serde(default)]
    pub selectors: PortalSelectors,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            themes_path: default_themes_path(),
            dataset_path: default_dataset_path(),
            page_param: default_page_param(),
            max_pages: None,
            policies: CrawlPolicies::default(),
            selectors: PortalSelectors::default(),
        }
    }
}

impl PortalConfig {
    /// Canonical dataset page URL for a dataset name.
    pub fn canonical_dataset_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.dataset_path.trim_matches('/'),
            name
        )
    }

    /// Apply a CLI page ceiling, where 0 means unbounded.
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        if let Some(max) = max_pages {
            self.max_pages = if max == 0 { None } else { Some(max) };
        }
        self
    }
}

fn default_base_url() -> String {
    "https://data.gov.ma".to_string()
}

fn default_themes_path() -> String {
    "/data/fr/group".to_string()
}

fn default_dataset_path() -> String {
    "/data/fr/dataset".to_string()
}

fn default_page_param() -> String {
    "page".to_string()
}

/// CSS selectors describing the portal's markup.
///
/// Theme names and theme links are matched by position, so
/// `theme_name` and `theme_link` must select the same number of elements in
/// the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSelectors {
    /// Theme heading elements on the theme index.
    pub theme_name: String,
    /// Theme listing links on the theme index.
    pub theme_link: String,
    /// One container per dataset on a listing page.
    pub dataset_item: String,
    /// Stub link inside a dataset item container, as whitespace-separated
    /// steps. Each step takes the first match inside the previous one.
    pub stub_link: String,
    /// First resource link on a dataset's listing page.
    pub resource_link: String,
    /// Tag list container on the resource page.
    pub tag_list: String,
    /// Tag entries inside the tag list.
    pub tag: String,
    /// Analytics-tracked primary resource link on the resource page.
    pub download_link: String,
}

impl Default for PortalSelectors {
    fn default() -> Self {
        Self {
            theme_name: "h2.media-heading".to_string(),
            theme_link: "a.media-view".to_string(),
            dataset_item: "li.dataset-item".to_string(),
            stub_link: "ul li a".to_string(),
            resource_link: "li.resource-item a".to_string(),
            tag_list: "ul.tag-list".to_string(),
            tag: "li".to_string(),
            download_link: "a.resource-url-analytics".to_string(),
        }
    }
}
