//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.huginn/config.toml` (user)
//! 3. `/etc/huginn/config.toml` (system)
//!
//! When none of these exist the built-in defaults are used. Every field is
//! optional.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::linkify::{DEFAULT_REPO_MARKER, DEFAULT_VIEW_URL};
use crate::storage::gcs::DEFAULT_BASE_URL;
use crate::types::DEFAULT_BUCKET;
use crate::{HuginnError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub buckets: BucketsConfig,
    #[serde(default)]
    pub links: LinksConfig,
}

/// Object store settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// GCS JSON API endpoint (default: https://storage.googleapis.com).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-call timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Cache settings, in seconds. Unset fields keep [`CacheConfig`] defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSection {
    #[serde(default)]
    pub max_entries: Option<u64>,
    #[serde(default)]
    pub object_ttl_secs: Option<u64>,
    #[serde(default)]
    pub object_negative_ttl_secs: Option<u64>,
    #[serde(default)]
    pub listing_ttl_secs: Option<u64>,
    #[serde(default)]
    pub details_ttl_secs: Option<u64>,
    #[serde(default)]
    pub details_negative_ttl_secs: Option<u64>,
}

impl From<CacheSection> for CacheConfig {
    fn from(section: CacheSection) -> Self {
        let defaults = CacheConfig::default();
        let secs = |v: Option<u64>, d: Duration| v.map(Duration::from_secs).unwrap_or(d);
        CacheConfig {
            max_entries: section.max_entries.unwrap_or(defaults.max_entries),
            object_ttl: secs(section.object_ttl_secs, defaults.object_ttl),
            object_negative_ttl: secs(
                section.object_negative_ttl_secs,
                defaults.object_negative_ttl,
            ),
            listing_ttl: secs(section.listing_ttl_secs, defaults.listing_ttl),
            details_ttl: secs(section.details_ttl_secs, defaults.details_ttl),
            details_negative_ttl: secs(
                section.details_negative_ttl_secs,
                defaults.details_negative_ttl,
            ),
        }
    }
}

/// Buckets that may be served.
#[derive(Debug, Clone, Deserialize)]
pub struct BucketsConfig {
    #[serde(default = "default_buckets")]
    pub allowed: Vec<String>,
}

impl Default for BucketsConfig {
    fn default() -> Self {
        Self {
            allowed: default_buckets(),
        }
    }
}

fn default_buckets() -> Vec<String> {
    vec![DEFAULT_BUCKET.to_string()]
}

/// Stack trace link settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LinksConfig {
    /// Directory name marking the repository root in stack traces.
    #[serde(default = "default_repo_marker")]
    pub repo_marker: String,
    /// Source browser URL with `{commit}`, `{path}` and `{line}` placeholders.
    #[serde(default = "default_view_url")]
    pub view_url_template: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            repo_marker: default_repo_marker(),
            view_url_template: default_view_url(),
        }
    }
}

fn default_repo_marker() -> String {
    DEFAULT_REPO_MARKER.to_string()
}

fn default_view_url() -> String {
    DEFAULT_VIEW_URL.to_string()
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided, must exist)
    /// 2. `~/.huginn/config.toml`
    /// 3. `/etc/huginn/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a configuration file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(HuginnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".huginn").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/huginn/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}
