//! HTTP page fetcher.
//!
//! One GET per call, no retries. Every attempt is logged with its URL and
//! status code (or transport error), which is what ends up in the run log.

mod response;
mod user_agent;

pub use response::{FetchFailure, FetchOutcome};
pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

/// Anything that can turn a URL into a [`FetchOutcome`].
///
/// The crawl pipeline only talks to this trait so tests can serve canned
/// pages without a network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// reqwest-backed fetcher.
///
/// Redirects follow reqwest's default policy.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client with the default user agent and transport timeout.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_options(None, None)
    }

    /// Create a client with an optional user agent override and timeout.
    /// A `None` timeout leaves reqwest's default in place.
    pub fn with_options(
        user_agent_config: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let user_agent = resolve_user_agent(user_agent_config);
        let mut builder = Client::builder().user_agent(user_agent).gzip(true).brotli(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Make a GET request and classify the result.
    pub async fn get(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("GET {} failed: {}", url, e);
                return FetchOutcome::Failure(FetchFailure::Transport(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        info!("GET {} -> {}", url, status);

        if !response.status().is_success() {
            return FetchOutcome::Failure(FetchFailure::Status(status));
        }

        match response.bytes().await {
            Ok(body) => FetchOutcome::Success {
                body: body.to_vec(),
                status,
            },
            Err(e) => {
                warn!("Reading body of {} failed: {}", url, e);
                FetchOutcome::Failure(FetchFailure::Transport(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.get(url).await
    }
}
