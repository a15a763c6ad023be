//! Dataset model resolved from a portal resource page.

use std::collections::BTreeSet;
use std::fmt;

/// A dataset resolved from its resource page.
///
/// Owned by exactly one [`Theme`](super::Theme). Names are unique only within
/// their theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    /// Identifier taken from the resource URL's `dataset/<name>` segment.
    pub name: String,
    /// Canonical dataset page URL (constructed, not necessarily fetched).
    pub canonical_url: String,
    /// Absolute or relative URL of the primary binary resource.
    pub download_link: String,
    /// Tags shown on the resource page.
    pub tags: BTreeSet<String>,
}

impl Dataset {
    /// Create a dataset with an empty tag set.
    pub fn new(name: String, canonical_url: String, download_link: String) -> Self {
        Self {
            name,
            canonical_url,
            download_link,
            tags: BTreeSet::new(),
        }
    }

    /// Add tags, ignoring blanks.
    pub fn with_tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        for tag in tags {
            self.add_tag(tag);
        }
        self
    }

    /// Add a single tag. Returns false for blanks and duplicates.
    pub fn add_tag(&mut self, tag: String) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        self.tags.insert(tag.to_string())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        writeln!(f, "Dataset: {}", self.name)?;
        writeln!(f, "URL: {}", self.canonical_url)?;
        writeln!(f, "Download Link: {}", self.download_link)?;
        write!(f, "Tags: {}", tags.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str) -> Dataset {
        Dataset::new(
            name.to_string(),
            format!("https://data.gov.ma/data/fr/dataset/{}", name),
            "/download/file.xlsx".to_string(),
        )
    }

    #[test]
    fn test_new_datasets_do_not_share_tags() {
        let mut first = sample("cheptel");
        let second = sample("peche");

        first.add_tag("agriculture".to_string());

        assert_eq!(first.tags.len(), 1);
        assert!(second.tags.is_empty());
    }

    #[test]
    fn test_add_tag_trims_and_deduplicates() {
        let mut dataset = sample("cheptel");
        assert!(dataset.add_tag("  elevage ".to_string()));
        assert!(!dataset.add_tag("elevage".to_string()));
        assert!(!dataset.add_tag("   ".to_string()));
        assert_eq!(dataset.tags.iter().collect::<Vec<_>>(), vec!["elevage"]);
    }

    #[test]
    fn test_display_lists_tags() {
        let dataset = sample("cheptel")
            .with_tags(vec!["ovins".to_string(), "bovins".to_string()]);
        let rendered = dataset.to_string();
        assert!(rendered.starts_with("Dataset: cheptel\n"));
        assert!(rendered.ends_with("Tags: bovins, ovins"));
    }
}
