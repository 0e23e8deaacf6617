//! Object storage access.
//!
//! [`ObjectStore`] is the raw backend seam (errors included).
//! [`StorageAccessor`] is what the rest of the crate talks to: it bounds
//! every call with a timeout, turns every failure into "absent", and
//! memoizes both reads and listings.

pub mod gcs;
pub mod memory;

pub use gcs::GcsClient;
pub use memory::InMemoryStore;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::cache::{CacheConfig, Fetch, MemoCache, MemoPolicy, Memoized};
use crate::telemetry;
use crate::types::FileStat;
use crate::{HuginnError, Result};

/// Cache prefix for object reads.
pub const READ_PREFIX: &str = "gs://";

/// Cache prefix for directory listings.
pub const LIST_PREFIX: &str = "gs-ls://";

/// Default bound on a single storage call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A backend holding objects addressed as `/<bucket>/<object>`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Read a whole object.
    async fn read(&self, path: &str) -> Result<Bytes>;

    /// List the immediate children of `dir` (which ends in `/`).
    ///
    /// Nested objects are collapsed into one directory entry per child
    /// prefix.
    async fn list(&self, dir: &str) -> Result<Vec<FileStat>>;
}

/// Split `/<bucket>/<object>` into its bucket and object name.
///
/// The object name may be empty (bucket root) only when `allow_empty_object`
/// is set, which listings need.
pub fn split_path(path: &str, allow_empty_object: bool) -> Result<(&str, &str)> {
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| HuginnError::InvalidPath(format!("{path}: must start with '/'")))?;
    let (bucket, object) = rest.split_once('/').unwrap_or((rest, ""));
    if bucket.is_empty() || (object.is_empty() && !allow_empty_object) {
        return Err(HuginnError::InvalidPath(format!(
            "{path}: expected /<bucket>/<object>"
        )));
    }
    Ok((bucket, object))
}

async fn bounded<T>(timeout: Duration, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(HuginnError::Timeout(timeout)))
}

fn log_failure(kind: &'static str, store: &str, path: &str, error: &HuginnError) {
    metrics::counter!(telemetry::STORAGE_FAILURES_TOTAL, "kind" => kind).increment(1);
    if error.is_not_found() {
        debug!(store, path, kind, "object not found");
    } else {
        warn!(store, path, kind, error = %error, "storage call failed, treating as absent");
    }
}

struct ReadObject {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

#[async_trait]
impl Fetch for ReadObject {
    type Output = Option<Bytes>;

    async fn fetch(&self, path: &str) -> Option<Bytes> {
        metrics::counter!(telemetry::STORAGE_CALLS_TOTAL, "kind" => "read").increment(1);
        match bounded(self.timeout, self.store.read(path)).await {
            Ok(data) => Some(data),
            Err(e) => {
                log_failure("read", self.store.name(), path, &e);
                None
            }
        }
    }
}

struct ListDir {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

#[async_trait]
impl Fetch for ListDir {
    type Output = Vec<FileStat>;

    async fn fetch(&self, dir: &str) -> Vec<FileStat> {
        metrics::counter!(telemetry::STORAGE_CALLS_TOTAL, "kind" => "list").increment(1);
        match bounded(self.timeout, self.store.list(dir)).await {
            Ok(entries) => entries,
            Err(e) => {
                log_failure("list", self.store.name(), dir, &e);
                Vec::new()
            }
        }
    }
}

/// Soft-failing, memoized access to an [`ObjectStore`].
pub struct StorageAccessor {
    reads: Memoized<ReadObject>,
    listings: Memoized<ListDir>,
}

impl StorageAccessor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        cache: MemoCache,
        config: &CacheConfig,
        timeout: Duration,
    ) -> Self {
        let reads = Memoized::new(
            cache.clone(),
            MemoPolicy::new(READ_PREFIX, config.object_ttl, config.object_negative_ttl),
            ReadObject {
                store: Arc::clone(&store),
                timeout,
            },
        );
        let listings = Memoized::new(
            cache,
            MemoPolicy::new(LIST_PREFIX, config.listing_ttl, config.listing_ttl),
            ListDir { store, timeout },
        );
        Self { reads, listings }
    }

    /// Read an object; `None` if it is missing or could not be read.
    pub async fn read(&self, path: &str) -> Option<Bytes> {
        self.reads.call(path).await
    }

    /// List the immediate children of a directory.
    ///
    /// A missing trailing `/` is added, so `a/b` and `a/b/` share one
    /// cache entry.
    pub async fn list(&self, dir: &str) -> Vec<FileStat> {
        if dir.ends_with('/') {
            self.listings.call(dir).await
        } else {
            self.listings.call(&format!("{dir}/")).await
        }
    }
}
