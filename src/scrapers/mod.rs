//! Portal crawler: fetch, parse, paginate, resolve.

pub mod config;
mod http_client;
pub mod pagination;
pub mod parser;
pub mod policy;
pub mod portal;
pub mod resolver;

pub use config::{PortalConfig, PortalSelectors};
pub use http_client::{
    resolve_user_agent, FetchFailure, FetchOutcome, HttpClient, PageFetcher, USER_AGENT,
};
pub use pagination::{ListingPage, ListingState, Paginator};
pub use parser::{PageParser, ParseError, ThemeEntry};
pub use policy::{CrawlPolicies, FailurePolicy};
pub use portal::{CrawlError, CrawlSummary, PortalCrawler, ThemeReport};
pub use resolver::{dataset_name_from_url, DatasetResolver, ResolveError};
