//! Builder for configuring viewer instances

use std::sync::Arc;
use std::time::Duration;

use super::BuildViewer;
use crate::cache::{CacheBackend, CacheConfig, CacheNamespace, MemoCache, MemoryBackend};
use crate::config::Config;
use crate::details::BuildDetailAggregator;
use crate::linkify::SourceLinker;
use crate::storage::{DEFAULT_TIMEOUT, GcsClient, ObjectStore, StorageAccessor};
use crate::types::BucketAllowList;
use crate::{HuginnError, Result};

/// Main entry point for creating viewer instances.
pub struct Huginn;

impl Huginn {
    /// Create a new builder for configuring the viewer.
    pub fn builder() -> HuginnBuilder {
        HuginnBuilder::new()
    }

    /// Build a viewer backed by GCS from a loaded [`Config`].
    ///
    /// The cache namespace comes from the environment (see
    /// [`CacheNamespace::from_env`]).
    pub fn from_config(config: &Config) -> Result<BuildViewer> {
        let timeout = config.storage.timeout();
        let store = GcsClient::with_base_url(&config.storage.base_url, timeout)?;
        let linker = SourceLinker::new(
            &config.links.repo_marker,
            config.links.view_url_template.clone(),
        )?;
        Self::builder()
            .store(Arc::new(store))
            .cache_config(config.cache.clone().into())
            .allowed_buckets(config.buckets.allowed.iter().cloned())
            .storage_timeout(timeout)
            .linker(linker)
            .build()
    }
}

/// Builder for configuring viewer instances.
pub struct HuginnBuilder {
    store: Option<Arc<dyn ObjectStore>>,
    backend: Option<Arc<dyn CacheBackend>>,
    namespace: Option<CacheNamespace>,
    cache_config: CacheConfig,
    allowed_buckets: BucketAllowList,
    storage_timeout: Duration,
    linker: SourceLinker,
}

impl HuginnBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            backend: None,
            namespace: None,
            cache_config: CacheConfig::default(),
            allowed_buckets: BucketAllowList::default(),
            storage_timeout: DEFAULT_TIMEOUT,
            linker: SourceLinker::default(),
        }
    }

    /// Object store holding build logs. Required.
    pub fn store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Shared cache backend (default: an in-process [`MemoryBackend`]
    /// sized by the cache config).
    pub fn backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Cache namespace (default: [`CacheNamespace::from_env`]).
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(CacheNamespace::new(namespace));
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Buckets that may be served (default: `kubernetes-jenkins`).
    pub fn allowed_buckets<I, S>(mut self, buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_buckets = BucketAllowList::new(buckets);
        self
    }

    /// Per-call storage timeout (default: 30 seconds).
    pub fn storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    pub fn linker(mut self, linker: SourceLinker) -> Self {
        self.linker = linker;
        self
    }

    /// Build the viewer.
    pub fn build(self) -> Result<BuildViewer> {
        let store = self
            .store
            .ok_or_else(|| HuginnError::Configuration("no object store configured".into()))?;
        let backend = self.backend.unwrap_or_else(|| {
            Arc::new(MemoryBackend::new(self.cache_config.max_entries)) as Arc<dyn CacheBackend>
        });
        let namespace = self.namespace.unwrap_or_else(CacheNamespace::from_env);
        let cache = MemoCache::new(backend, namespace);

        let storage = Arc::new(StorageAccessor::new(
            store,
            cache.clone(),
            &self.cache_config,
            self.storage_timeout,
        ));
        let aggregator =
            BuildDetailAggregator::new(Arc::clone(&storage), cache, &self.cache_config);

        Ok(BuildViewer {
            storage,
            aggregator,
            allowed: self.allowed_buckets,
            linker: self.linker,
        })
    }
}

impl Default for HuginnBuilder {
    fn default() -> Self {
        Self::new()
    }
}
