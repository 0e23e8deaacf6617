//! Memoization of single-argument fetches.
//!
//! A [`Memoized`] wraps a [`Fetch`] with a [`MemoPolicy`] (key prefix plus
//! positive and negative TTLs) and a [`MemoCache`] handle (backend plus
//! deployment namespace). Empty results are cached too, under the shorter
//! negative TTL, which bounds how often a missing object is asked for.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use super::CacheNamespace;
use super::backend::{CacheBackend, CacheKey, CachedValue};
use crate::telemetry;
use crate::types::{BuildDetails, FileStat};

/// A value that can live in the memo cache.
pub trait Cacheable: Sized + Send {
    /// Whether this is a positive result (cached with the long TTL).
    fn is_truthy(&self) -> bool;

    /// Copy into the shared cached-value representation.
    fn to_cached(&self) -> CachedValue;

    /// Recover from a cached value. `None` means the entry belongs to a
    /// different value type and is treated as a miss.
    fn from_cached(value: CachedValue) -> Option<Self>;
}

impl Cacheable for Option<Bytes> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(|b| !b.is_empty())
    }

    fn to_cached(&self) -> CachedValue {
        match self {
            Some(bytes) => CachedValue::Object(bytes.clone()),
            None => CachedValue::Absent,
        }
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Object(bytes) => Some(Some(bytes)),
            CachedValue::Absent => Some(None),
            _ => None,
        }
    }
}

impl Cacheable for Vec<FileStat> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }

    fn to_cached(&self) -> CachedValue {
        CachedValue::Listing(self.clone())
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Listing(entries) => Some(entries),
            CachedValue::Absent => Some(Vec::new()),
            _ => None,
        }
    }
}

impl Cacheable for Option<BuildDetails> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }

    fn to_cached(&self) -> CachedValue {
        match self {
            Some(details) => CachedValue::Build(Box::new(details.clone())),
            None => CachedValue::Absent,
        }
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Build(details) => Some(Some(*details)),
            CachedValue::Absent => Some(None),
            _ => None,
        }
    }
}

/// A single-argument fetch operation that can be memoized.
#[async_trait]
pub trait Fetch: Send + Sync {
    type Output: Cacheable;

    async fn fetch(&self, argument: &str) -> Self::Output;
}

/// Key prefix and expirations for one memoized operation.
///
/// The negative TTL is clamped to the positive TTL, so an empty result
/// never outlives a real one stored under the same prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoPolicy {
    prefix: String,
    ttl: Duration,
    negative_ttl: Duration,
}

impl MemoPolicy {
    pub fn new(prefix: impl Into<String>, ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            ttl,
            negative_ttl: negative_ttl.min(ttl),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn negative_ttl(&self) -> Duration {
        self.negative_ttl
    }

    /// TTL for a result of the given truthiness.
    pub fn ttl_for(&self, truthy: bool) -> Duration {
        if truthy { self.ttl } else { self.negative_ttl }
    }
}

/// Shared handle to a cache backend, scoped to one deployment namespace.
#[derive(Clone)]
pub struct MemoCache {
    backend: Arc<dyn CacheBackend>,
    namespace: CacheNamespace,
}

impl MemoCache {
    pub fn new(backend: Arc<dyn CacheBackend>, namespace: CacheNamespace) -> Self {
        Self { backend, namespace }
    }

    pub fn namespace(&self) -> &CacheNamespace {
        &self.namespace
    }

    pub fn key(&self, prefix: &str, argument: &str) -> CacheKey {
        CacheKey {
            namespace: self.namespace.as_str().to_string(),
            prefix: prefix.to_string(),
            argument: argument.to_string(),
        }
    }
}

/// A fetch wrapped with memoization.
pub struct Memoized<F> {
    cache: MemoCache,
    policy: MemoPolicy,
    fetch: F,
}

impl<F: Fetch> Memoized<F> {
    pub fn new(cache: MemoCache, policy: MemoPolicy, fetch: F) -> Self {
        Self {
            cache,
            policy,
            fetch,
        }
    }

    pub fn policy(&self) -> &MemoPolicy {
        &self.policy
    }

    /// Return the cached result for `argument`, or fetch and cache it.
    ///
    /// If the backend cannot be read the fetch runs uncached.
    pub async fn call(&self, argument: &str) -> F::Output {
        let key = self.cache.key(&self.policy.prefix, argument);
        let operation = self.policy.prefix.clone();

        match self.cache.backend.get(&key).await {
            Ok(Some(cached)) => {
                if let Some(value) = F::Output::from_cached(cached) {
                    metrics::counter!(telemetry::CACHE_HITS_TOTAL, "operation" => operation)
                        .increment(1);
                    return value;
                }
                warn!(%key, "cached value has unexpected type, refetching");
            }
            Ok(None) => {}
            Err(e) => {
                warn!(%key, error = %e, "cache backend unavailable, fetching uncached");
                metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "operation" => operation)
                    .increment(1);
                return self.fetch.fetch(argument).await;
            }
        }

        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "operation" => operation.clone())
            .increment(1);
        let value = self.fetch.fetch(argument).await;
        let ttl = self.policy.ttl_for(value.is_truthy());
        debug!(%key, ?ttl, "caching fetch result");

        if let Err(e) = self.cache.backend.set(&key, value.to_cached(), ttl).await {
            warn!(%key, error = %e, "failed to store cache entry");
            metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "operation" => operation)
                .increment(1);
        }
        value
    }
}
