//! Data models for harvested portal content.

mod dataset;
mod theme;

pub use dataset::Dataset;
pub use theme::Theme;
