//! HTTP request handlers for the read API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::object_store::ObjectMeta;

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Query parameters for a single dataset.
#[derive(Debug, Deserialize)]
pub struct DatasetParams {
    pub theme: Option<String>,
    pub dataset: Option<String>,
}

/// Query parameters for a theme listing.
#[derive(Debug, Deserialize)]
pub struct ThemeParams {
    pub theme: Option<String>,
}

/// Listing entry, keyed the way existing clients expect.
#[derive(Debug, Serialize)]
pub struct DatasetEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "LastModified")]
    pub last_modified: String,
    #[serde(rename = "Size")]
    pub size: u64,
}

impl From<ObjectMeta> for DatasetEntry {
    fn from(meta: ObjectMeta) -> Self {
        Self {
            name: file_stem(&meta.key).to_string(),
            last_modified: meta.last_modified.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            size: meta.size,
        }
    }
}

/// `GET /themes/:theme/datasets/:dataset`
pub async fn dataset_by_path(
    State(state): State<AppState>,
    Path((theme, dataset)): Path<(String, String)>,
) -> Result<Json<Vec<Vec<String>>>, ApiError> {
    let dataset = dataset.strip_suffix(".csv").unwrap_or(&dataset);
    load_rows(&state, &theme, dataset).await.map(Json)
}

/// `GET /dataset?theme=..&dataset=..`
pub async fn dataset_by_query(
    State(state): State<AppState>,
    Query(params): Query<DatasetParams>,
) -> Result<Json<Vec<Vec<String>>>, ApiError> {
    let theme = non_blank(params.theme.as_deref());
    let dataset = non_blank(params.dataset.as_deref());
    let (Some(theme), Some(dataset)) = (theme, dataset) else {
        return Err(ApiError::MissingParameters("theme, dataset"));
    };
    load_rows(&state, theme, dataset).await.map(Json)
}

/// `GET /datasets?theme=..`
pub async fn list_datasets(
    State(state): State<AppState>,
    Query(params): Query<ThemeParams>,
) -> Result<Json<Vec<DatasetEntry>>, ApiError> {
    let theme = non_blank(params.theme.as_deref()).ok_or(ApiError::MissingParameters("theme"))?;
    let prefix = state.theme_prefix(theme);

    let entries: Vec<DatasetEntry> = state
        .store
        .list_objects(&prefix)
        .await?
        .into_iter()
        .map(DatasetEntry::from)
        .collect();
    Ok(Json(entries))
}

async fn load_rows(
    state: &AppState,
    theme: &str,
    dataset: &str,
) -> Result<Vec<Vec<String>>, ApiError> {
    let key = state.tabular_key(theme, dataset);
    tracing::debug!("Reading tabular object {}", key);
    let bytes = state.store.get_object(&key).await?;
    parse_rows(&bytes)
}

/// All rows of a CSV object, header row first.
pub fn parse_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>, ApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn file_stem(key: &str) -> &str {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}
