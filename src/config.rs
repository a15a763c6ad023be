//! Configuration management for datagov using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scrapers::PortalConfig;

/// Default data directory for downloaded datasets.
const DEFAULT_DATA_DIR: &str = "data";
/// Run log filename inside the data directory.
const DEFAULT_LOG_FILENAME: &str = "crawl.log";
/// Default directory standing in for object storage.
const DEFAULT_OBJECT_ROOT: &str = "objects";
/// Default bucket holding converted tabular files.
pub const DEFAULT_BUCKET: &str = "data-morocco";
/// Default key prefix of converted tabular files.
pub const DEFAULT_TABULAR_PREFIX: &str = "csv_data";
/// Default read API bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3030";

/// Error types for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root of the theme-partitioned download tree.
    pub data_dir: PathBuf,
    /// Explicit run log path. When unset the log lives in the data directory.
    log_file: Option<PathBuf>,
    /// User agent override for HTTP requests.
    pub user_agent: Option<String>,
    /// Request timeout in seconds (None = transport default).
    pub request_timeout: Option<u64>,
    /// Portal layout and selectors.
    pub portal: PortalConfig,
    /// Directory whose subdirectories act as object storage buckets.
    pub object_root: PathBuf,
    /// Bucket holding converted tabular files.
    pub bucket: String,
    /// Key prefix of converted tabular files.
    pub tabular_prefix: String,
    /// Read API bind address.
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_file: None,
            user_agent: None,
            request_timeout: None,
            portal: PortalConfig::default(),
            object_root: PathBuf::from(DEFAULT_OBJECT_ROOT),
            bucket: DEFAULT_BUCKET.to_string(),
            tabular_prefix: DEFAULT_TABULAR_PREFIX.to_string(),
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Settings {
    /// Point downloads at a new data directory. A run log without an
    /// explicit path follows it.
    pub fn set_data_dir(&mut self, data_dir: PathBuf) {
        self.data_dir = data_dir;
    }

    pub fn set_log_file(&mut self, log_file: PathBuf) {
        self.log_file = Some(log_file);
    }

    /// Run log path: the explicit one, or `<data_dir>/crawl.log`.
    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DEFAULT_LOG_FILENAME))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout.map(Duration::from_secs)
    }

    /// Ensure the data directory and the log file's directory exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })?;
        if let Some(parent) = self.log_file().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Effective settings as a config file, for display.
    pub fn to_config(&self) -> Config {
        Config {
            data_dir: Some(self.data_dir.display().to_string()),
            log_file: self.log_file.as_ref().map(|p| p.display().to_string()),
            user_agent: self.user_agent.clone(),
            request_timeout: self.request_timeout,
            object_root: Some(self.object_root.display().to_string()),
            bucket: Some(self.bucket.clone()),
            tabular_prefix: Some(self.tabular_prefix.clone()),
            bind: Some(self.bind.clone()),
            portal: Some(self.portal.clone()),
            source_path: None,
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Run log file path (defaults to `<data_dir>/crawl.log`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Object storage root directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_root: Option<String>,
    /// Object storage bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Tabular object key prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabular_prefix: Option<String>,
    /// Read API bind address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// Portal layout and selectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal: Option<PortalConfig>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers datagov config files in standard locations.
    pub async fn load() -> Result<Self, ConfigError> {
        let Ok(discovered) = prefer::load("datagov").await else {
            tracing::debug!("No config file discovered, using defaults");
            return Ok(Self::default());
        };

        match discovered.source_path() {
            Some(path) => Self::load_from_path(path).await,
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)?,
            _ => serde_json::from_str(&contents)?,
        };

        tracing::debug!("Loaded config from {}", path.display());
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.set_data_dir(self.resolve_path(data_dir, base_dir));
        }
        if let Some(ref log_file) = self.log_file {
            settings.set_log_file(self.resolve_path(log_file, base_dir));
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = Some(timeout);
        }
        if let Some(ref object_root) = self.object_root {
            settings.object_root = self.resolve_path(object_root, base_dir);
        }
        if let Some(ref bucket) = self.bucket {
            settings.bucket = bucket.clone();
        }
        if let Some(ref prefix) = self.tabular_prefix {
            settings.tabular_prefix = prefix.trim_matches('/').to_string();
        }
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        if let Some(ref portal) = self.portal {
            settings.portal = portal.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
}

/// Load config from the explicit path, or discover one.
async fn load_file_config(options: &LoadOptions) -> Result<Config, ConfigError> {
    match options.config_path {
        Some(ref config_path) => Config::load_from_path(config_path).await,
        None => Config::load().await,
    }
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    let config = load_file_config(&options).await?;

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd
    } else {
        config.base_dir().unwrap_or(cwd)
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    apply_env_overrides(&mut settings);

    Ok((settings, config))
}

/// DATAGOV_* environment variables take precedence over the config file.
fn apply_env_overrides(settings: &mut Settings) {
    if let Some(data_dir) = env_value("DATAGOV_DATA_DIR") {
        tracing::debug!("Using DATAGOV_DATA_DIR from environment: {}", data_dir);
        settings.set_data_dir(PathBuf::from(shellexpand::tilde(&data_dir).as_ref()));
    }
    if let Some(object_root) = env_value("DATAGOV_OBJECT_ROOT") {
        tracing::debug!("Using DATAGOV_OBJECT_ROOT from environment: {}", object_root);
        settings.object_root = PathBuf::from(shellexpand::tilde(&object_root).as_ref());
    }
    if let Some(bucket) = env_value("DATAGOV_BUCKET") {
        settings.bucket = bucket;
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.data_dir, PathBuf::from("data"));
        assert_eq!(settings.log_file(), PathBuf::from("data/crawl.log"));
        assert_eq!(settings.bucket, "data-morocco");
        assert_eq!(settings.tabular_prefix, "csv_data");
        assert_eq!(settings.request_timeout(), None);
        assert_eq!(settings.portal.base_url, "https://data.gov.ma");
    }

    #[tokio::test]
    async fn test_load_toml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datagov.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "downloads"
request_timeout = 20

[portal]
base_url = "http://mirror.test"
max_pages = 5

[portal.selectors]
download_link = "a.download"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, &config.base_dir().unwrap());

        assert_eq!(settings.data_dir, dir.path().join("downloads"));
        assert_eq!(settings.log_file(), dir.path().join("downloads").join("crawl.log"));
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(20)));
        assert_eq!(settings.portal.base_url, "http://mirror.test");
        assert_eq!(settings.portal.max_pages, Some(5));
        assert_eq!(settings.portal.themes_path, "/data/fr/group");
        assert_eq!(settings.portal.selectors.download_link, "a.download");
        assert_eq!(settings.portal.selectors.tag_list, "ul.tag-list");
    }

    #[tokio::test]
    async fn test_load_yaml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datagov.yaml");
        std::fs::write(&path, "bucket: archive\ntabular_prefix: /tables/\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, dir.path());

        assert_eq!(settings.bucket, "archive");
        assert_eq!(settings.tabular_prefix, "tables");
    }

    #[tokio::test]
    async fn test_load_json_config_with_absolute_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datagov.json");
        std::fs::write(
            &path,
            r#"{"object_root": "/srv/objects", "bind": "0.0.0.0:8080"}"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, dir.path());

        assert_eq!(settings.object_root, PathBuf::from("/srv/objects"));
        assert_eq!(settings.bind, "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_load_invalid_config_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datagov.toml");
        std::fs::write(&path, "data_dir = [").unwrap();

        assert!(matches!(
            Config::load_from_path(&path).await,
            Err(ConfigError::Toml(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_config_fails() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Config::load_from_path(&dir.path().join("nope.toml")).await,
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_to_config_round_trips_through_toml() {
        let settings = Settings::default();
        let rendered = toml::to_string_pretty(&settings.to_config()).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();

        let mut restored = Settings::default();
        parsed.apply_to_settings(&mut restored, Path::new("/"));
        assert_eq!(restored.bucket, settings.bucket);
        assert_eq!(restored.portal, settings.portal);
    }

    #[tokio::test]
    async fn test_explicit_log_file_survives_data_dir_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datagov.toml");
        std::fs::write(&path, "log_file = \"/var/log/datagov.log\"\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, dir.path());
        settings.set_data_dir(PathBuf::from("/tmp/other"));

        assert_eq!(settings.data_dir, PathBuf::from("/tmp/other"));
        assert_eq!(settings.log_file(), PathBuf::from("/var/log/datagov.log"));
    }

    #[test]
    fn test_default_log_file_follows_data_dir() {
        let mut settings = Settings::default();
        settings.set_data_dir(PathBuf::from("/tmp/other"));
        assert_eq!(settings.log_file(), PathBuf::from("/tmp/other/crawl.log"));
        assert!(settings.to_config().log_file.is_none());
    }
}
