//! Router configuration for the read API.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/themes/:theme/datasets/:dataset",
            get(handlers::dataset_by_path),
        )
        .route("/dataset", get(handlers::dataset_by_query))
        .route("/datasets", get(handlers::list_datasets))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
