//! Read API serving converted tabular datasets from object storage.
//!
//! Objects live at `<tabular_prefix>/<theme>/<dataset>.csv`. Three lookups
//! are exposed: by path parameters, by query parameters, and a per-theme
//! listing.

mod error;
mod handlers;
mod routes;

pub use error::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::object_store::{LocalObjectStore, ObjectStore};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub tabular_prefix: String,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            store: Arc::new(LocalObjectStore::new(&settings.object_root, &settings.bucket)),
            tabular_prefix: settings.tabular_prefix.clone(),
        }
    }

    /// Object key of a dataset's tabular form.
    /// Key prefix of one theme's tabular objects, ending in `/`.
    pub fn theme_prefix(&self, theme: &str) -> String {
        if self.tabular_prefix.is_empty() {
            format!("{}/", theme)
        } else {
            format!("{}/{}/", self.tabular_prefix, theme)
        }
    }

    pub fn tabular_key(&self, theme: &str, dataset: &str) -> String {
        format!("{}{}.csv", self.theme_prefix(theme), dataset)
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, bind: Option<&str>) -> anyhow::Result<()> {
    let state = AppState::new(settings);
    let app = create_router(state);

    let addr: SocketAddr = bind.unwrap_or(&settings.bind).parse()?;
    tracing::info!(
        "Serving bucket {} from {} at http://{}",
        settings.bucket,
        settings.object_root.display(),
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
