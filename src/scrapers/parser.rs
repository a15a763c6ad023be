//! Structured-page extraction for the portal's HTML.
//!
//! All selectors are compiled once from [`PortalSelectors`]. Extraction works
//! on `&str` and returns owned values, so no parsed document outlives a call.

use std::collections::BTreeSet;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;

use super::config::PortalSelectors;

/// Error types for page extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("no element matches '{selector}'")]
    MissingElement { selector: String },
    #[error("element '{selector}' has no '{attribute}' attribute")]
    MissingAttribute { selector: String, attribute: String },
    #[error("theme index has {names} names but {links} links")]
    ThemeListingMismatch { names: usize, links: usize },
}

/// A theme entry on the theme index, before any datasets are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeEntry {
    pub name: String,
    pub listing_path: String,
}

#[derive(Debug, Clone)]
struct CompiledSelector {
    source: String,
    selector: Selector,
}

impl CompiledSelector {
    fn parse(source: &str) -> Result<Self, ParseError> {
        let selector = Selector::parse(source).map_err(|e| ParseError::InvalidSelector {
            selector: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }

    fn missing(&self) -> ParseError {
        ParseError::MissingElement {
            selector: self.source.clone(),
        }
    }

    fn first_in<'a>(&self, element: ElementRef<'a>) -> Option<ElementRef<'a>> {
        element.select(&self.selector).next()
    }

    fn href_of(&self, element: ElementRef<'_>) -> Result<String, ParseError> {
        element
            .value()
            .attr("href")
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
            .ok_or_else(|| ParseError::MissingAttribute {
                selector: self.source.clone(),
                attribute: "href".to_string(),
            })
    }
}

/// A chain of selectors walked one step at a time: each step takes the first
/// match among the descendants of the previous step's element.
///
/// `scraper` matches a compound selector like `ul li a` against the whole
/// ancestor chain, so inside an item nested in an outer list it would reach
/// any link. Walking the steps keeps every match inside the item.
#[derive(Debug, Clone)]
struct SelectorPath {
    source: String,
    steps: Vec<CompiledSelector>,
}

impl SelectorPath {
    fn parse(source: &str) -> Result<Self, ParseError> {
        let steps = source
            .split_whitespace()
            .map(CompiledSelector::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if steps.is_empty() {
            return Err(ParseError::InvalidSelector {
                selector: source.to_string(),
                reason: "empty selector path".to_string(),
            });
        }
        Ok(Self {
            source: source.to_string(),
            steps,
        })
    }

    fn href_in(&self, root: ElementRef<'_>) -> Option<String> {
        let target = self
            .steps
            .iter()
            .try_fold(root, |element, step| step.first_in(element))?;
        target
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_string)
    }
}

/// Page parser bound to one portal's markup.
#[derive(Debug, Clone)]
pub struct PageParser {
    theme_name: CompiledSelector,
    theme_link: CompiledSelector,
    dataset_item: CompiledSelector,
    stub_link: SelectorPath,
    resource_link: CompiledSelector,
    tag_list: CompiledSelector,
    tag: CompiledSelector,
    download_link: CompiledSelector,
}

impl PageParser {
    /// Compile all selectors, failing on the first invalid one.
    pub fn new(selectors: &PortalSelectors) -> Result<Self, ParseError> {
        Ok(Self {
            theme_name: CompiledSelector::parse(&selectors.theme_name)?,
            theme_link: CompiledSelector::parse(&selectors.theme_link)?,
            dataset_item: CompiledSelector::parse(&selectors.dataset_item)?,
            stub_link: SelectorPath::parse(&selectors.stub_link)?,
            resource_link: CompiledSelector::parse(&selectors.resource_link)?,
            tag_list: CompiledSelector::parse(&selectors.tag_list)?,
            tag: CompiledSelector::parse(&selectors.tag)?,
            download_link: CompiledSelector::parse(&selectors.download_link)?,
        })
    }

    /// Pair theme headings with theme links by position.
    ///
    /// The two node lists are not related through the DOM, only by order, so
    /// unequal counts are rejected instead of silently misaligning themes.
    pub fn extract_themes(&self, html: &str) -> Result<Vec<ThemeEntry>, ParseError> {
        let document = Html::parse_document(html);

        let names: Vec<String> = document
            .select(&self.theme_name.selector)
            .map(element_text)
            .collect();
        let links: Vec<String> = document
            .select(&self.theme_link.selector)
            .map(|el| self.theme_link.href_of(el))
            .collect::<Result<_, _>>()?;

        if names.len() != links.len() {
            return Err(ParseError::ThemeListingMismatch {
                names: names.len(),
                links: links.len(),
            });
        }

        Ok(names
            .into_iter()
            .zip(links)
            .map(|(name, listing_path)| ThemeEntry { name, listing_path })
            .collect())
    }

    /// One stub link per dataset item, found by walking the stub path inside
    /// the item. Items missing any step are skipped; the rest of the page is
    /// still returned.
    pub fn extract_dataset_stubs(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        document
            .select(&self.dataset_item.selector)
            .filter_map(|item| {
                let stub = self.stub_link.href_in(item);
                if stub.is_none() {
                    debug!("Skipping dataset item without '{}'", self.stub_link.source);
                }
                stub
            })
            .collect()
    }

    /// Tags from the tag list. A page without a tag list has no tags.
    pub fn extract_tags(&self, html: &str) -> BTreeSet<String> {
        let document = Html::parse_document(html);

        let Some(list) = document.select(&self.tag_list.selector).next() else {
            return BTreeSet::new();
        };

        list.select(&self.tag.selector)
            .map(element_text)
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    /// The analytics-tracked primary resource link. Its absence is an error.
    pub fn extract_download_link(&self, html: &str) -> Result<String, ParseError> {
        self.first_href(html, &self.download_link)
    }

    /// The first resource item link on a dataset's listing page.
    pub fn extract_resource_link(&self, html: &str) -> Result<String, ParseError> {
        self.first_href(html, &self.resource_link)
    }

    fn first_href(&self, html: &str, selector: &CompiledSelector) -> Result<String, ParseError> {
        let document = Html::parse_document(html);
        let element = document
            .select(&selector.selector)
            .next()
            .ok_or_else(|| selector.missing())?;
        selector.href_of(element)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
