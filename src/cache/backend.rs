//! Cache storage backends.
//!
//! [`CacheBackend`] is the seam between the memoizer and wherever entries
//! actually live. [`MemoryBackend`] keeps them in a bounded moka cache
//! with a per-entry time-to-live, so one backend can hold long-lived
//! positive entries and short-lived negative entries side by side.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use moka::Expiry;
use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::types::{BuildDetails, FileStat};

/// Composite cache key: `namespace :: prefix :: argument`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub namespace: String,
    pub prefix: String,
    pub argument: String,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.namespace, self.prefix, self.argument)
    }
}

/// Value stored by the memoizer.
///
/// `Absent` is the negative marker: "the fetch found nothing".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CachedValue {
    Absent,
    Object(Bytes),
    Listing(Vec<FileStat>),
    Build(Box<BuildDetails>),
}

/// Storage for memoized values.
///
/// Implementations only need single-key atomicity; concurrent writers of
/// the same key may race and the last write wins.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Look up a live entry. `Ok(None)` is a miss.
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedValue>>;

    /// Store an entry that expires after `ttl`.
    async fn set(&self, key: &CacheKey, value: CachedValue, ttl: Duration) -> Result<()>;
}

#[derive(Clone)]
struct Stored {
    value: CachedValue,
    ttl: Duration,
}

/// Expire each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Stored> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Stored,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Stored,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache backend (moka LRU with per-entry TTL).
pub struct MemoryBackend {
    cache: Cache<String, Stored>,
}

impl MemoryBackend {
    /// Create a backend holding at most `max_entries` entries.
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedValue>> {
        Ok(self.cache.get(&key.to_string()).await.map(|s| s.value))
    }

    async fn set(&self, key: &CacheKey, value: CachedValue, ttl: Duration) -> Result<()> {
        self.cache
            .insert(key.to_string(), Stored { value, ttl })
            .await;
        Ok(())
    }
}
