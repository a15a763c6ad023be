//! Theme model: a portal category and the datasets harvested under it.

use std::fmt;

use super::Dataset;

/// A thematic category discovered on the portal's theme index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Display name as shown on the theme index.
    pub name: String,
    /// Relative URL of the theme's paginated dataset listing.
    pub listing_path: String,
    datasets: Vec<Dataset>,
}

impl Theme {
    pub fn new(name: String, listing_path: String) -> Self {
        Self {
            name,
            listing_path,
            datasets: Vec::new(),
        }
    }

    /// Append a resolved dataset. Datasets are never removed during a run.
    pub fn add_dataset(&mut self, dataset: Dataset) {
        self.datasets.push(dataset);
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }

    /// Case-insensitive name match, used for `--theme` filters.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.datasets.iter().map(|d| d.name.as_str()).collect();
        writeln!(f, "Theme: {}", self.name)?;
        writeln!(f, "Datasets: [{}]", names.join(", "))?;
        write!(f, "Datasets Count: {}", self.datasets.len())
    }
}
