//! Caching subsystem.
//!
//! - [`backend`] — where entries live: the [`CacheBackend`] trait and the
//!   in-process [`MemoryBackend`].
//! - [`memo`] — [`Memoized`] fetch wrappers with separate TTLs for positive
//!   and negative results.
//!
//! Every key is scoped by a [`CacheNamespace`], normally the deployment
//! version. A new deployment reads none of the previous one's entries;
//! those simply age out.

pub mod backend;
pub mod memo;

pub use backend::{CacheBackend, CacheKey, CachedValue, MemoryBackend};
pub use memo::{Cacheable, Fetch, MemoCache, MemoPolicy, Memoized};

use std::fmt;
use std::time::Duration;

use crate::version;

/// Environment variable holding the deployment version used as namespace.
pub const NAMESPACE_ENV: &str = "HUGINN_DEPLOYMENT_VERSION";

/// Partition of the cache belonging to one deployment version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheNamespace(String);

impl CacheNamespace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self(namespace.into())
    }

    /// Read the namespace from [`NAMESPACE_ENV`], falling back to the
    /// crate's build version string.
    pub fn from_env() -> Self {
        match std::env::var(NAMESPACE_ENV) {
            Ok(v) if !v.is_empty() => Self(v),
            _ => Self(version::version_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Expirations and capacity for the memoized operations.
///
/// ```rust
/// # use huginn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(50_000)
///     .details_ttl(Duration::from_secs(8 * 3600));
/// assert!(config.object_negative_ttl <= config.object_ttl);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 10,000.
    pub max_entries: u64,
    /// Object reads that found data. Default: 1 hour.
    pub object_ttl: Duration,
    /// Object reads that found nothing. Default: 1 minute.
    pub object_negative_ttl: Duration,
    /// Directory listings, positive or empty. Default: 1 minute.
    pub listing_ttl: Duration,
    /// Aggregated build details. Default: 4 hours.
    pub details_ttl: Duration,
    /// Builds that could not be aggregated. Default: 1 minute.
    pub details_negative_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            object_ttl: Duration::from_secs(3600),
            object_negative_ttl: Duration::from_secs(60),
            listing_ttl: Duration::from_secs(60),
            details_ttl: Duration::from_secs(4 * 3600),
            details_negative_ttl: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    pub fn object_ttl(mut self, ttl: Duration) -> Self {
        self.object_ttl = ttl;
        self
    }

    pub fn object_negative_ttl(mut self, ttl: Duration) -> Self {
        self.object_negative_ttl = ttl;
        self
    }

    pub fn listing_ttl(mut self, ttl: Duration) -> Self {
        self.listing_ttl = ttl;
        self
    }

    pub fn details_ttl(mut self, ttl: Duration) -> Self {
        self.details_ttl = ttl;
        self
    }

    pub fn details_negative_ttl(mut self, ttl: Duration) -> Self {
        self.details_negative_ttl = ttl;
        self
    }
}
