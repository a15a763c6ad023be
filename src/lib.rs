//! datagov - open-government dataset harvester.
//!
//! Crawls a CKAN-style thematic data portal, downloads every dataset's
//! primary resource into a theme-partitioned tree, and serves converted
//! tabular files back through a small HTTP API.

pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod object_store;
pub mod scrapers;
pub mod server;
pub mod storage;

#[cfg(test)]
mod testing;
