//! Huginn - test result viewer backend for CI build logs
//!
//! CI jobs upload their results to an object store laid out as
//! `/<bucket>/<prefix>/<job>/<build>/`: a `started.json` and a
//! `finished.json` marker plus junit XML shards (optionally gzipped) under
//! `artifacts/`. This crate reads that layout through a memoizing cache and
//! assembles per-build summaries with the list of failed tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use huginn::{BuildPath, Huginn};
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let viewer = Huginn::from_config(&huginn::config::Config::load(None)?)?;
//!
//!     let path = BuildPath::parse("/kubernetes-jenkins/logs/ci-kubernetes-e2e-gce/1234")?;
//!     let report = viewer.build(&path).await?;
//!
//!     for failure in &report.details.failures {
//!         println!("{} ({})", failure.name, huginn::format::format_duration(failure.duration));
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod decompress;
pub mod details;
pub mod error;
pub mod format;
pub mod junit;
pub mod linkify;
pub mod listing;
pub mod sort;
pub mod storage;
pub mod telemetry;
pub mod types;
pub mod version;
pub mod viewer;

// Re-export main types at crate root
pub use cache::{CacheBackend, CacheConfig, CacheNamespace, MemoryBackend};
pub use details::BuildDetailAggregator;
pub use error::{HuginnError, Result};
pub use linkify::SourceLinker;
pub use listing::DirEntry;
pub use storage::{GcsClient, InMemoryStore, ObjectStore, StorageAccessor};
pub use version::{PKG_VERSION, version_string};
pub use viewer::{BuildReport, BuildViewer, Huginn, HuginnBuilder};

// Re-export all types
pub use types::{
    BucketAllowList, BuildDetails, BuildPath, FailureRecord, FileStat, FinishedInfo, StartedInfo,
};
