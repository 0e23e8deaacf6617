//! The build viewer: allow-list checks in front of cached storage access
//! and detail aggregation.

mod builder;

pub use builder::{Huginn, HuginnBuilder};

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::details::BuildDetailAggregator;
use crate::format::format_timestamp;
use crate::linkify::SourceLinker;
use crate::listing::{self, DirEntry};
use crate::storage::StorageAccessor;
use crate::types::{BucketAllowList, BuildDetails, BuildPath};
use crate::{HuginnError, Result};

/// Everything needed to render one build page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub path: BuildPath,
    pub job: String,
    pub build: String,
    /// Commit under test, if the started marker names one.
    pub commit: Option<String>,
    /// Start time (`YYYY-MM-DD HH:MM`, UTC), if recorded.
    pub started_at: Option<String>,
    pub details: BuildDetails,
}

/// Read side of the viewer. Create one with [`Huginn::builder`].
pub struct BuildViewer {
    pub(crate) storage: Arc<StorageAccessor>,
    pub(crate) aggregator: BuildDetailAggregator,
    pub(crate) allowed: BucketAllowList,
    pub(crate) linker: SourceLinker,
}

impl BuildViewer {
    /// Details of one build.
    ///
    /// Fails with [`HuginnError::NotFound`] for buckets outside the allow
    /// list, and when the build has not both started and finished.
    pub async fn build(&self, path: &BuildPath) -> Result<BuildReport> {
        self.allowed.check(path.bucket())?;
        let Some(details) = self.aggregator.aggregate(path).await else {
            debug!(path = %path, "build details unavailable");
            return Err(HuginnError::NotFound(format!(
                "build {path}: details could not be loaded"
            )));
        };
        Ok(BuildReport {
            path: path.clone(),
            job: path.job().to_string(),
            build: path.build().to_string(),
            commit: details.started.commit().map(str::to_string),
            started_at: details.started.timestamp.and_then(format_timestamp),
            details,
        })
    }

    /// Builds of a job directory, newest first.
    pub async fn builds(&self, job_dir: &str) -> Result<Vec<DirEntry>> {
        self.allowed.check_path(job_dir)?;
        Ok(listing::list_builds(&self.storage, job_dir).await)
    }

    /// Jobs under a prefix directory, in natural order.
    pub async fn jobs(&self, prefix_dir: &str) -> Result<Vec<DirEntry>> {
        self.allowed.check_path(prefix_dir)?;
        Ok(listing::list_jobs(&self.storage, prefix_dir).await)
    }

    /// Escape a failure body and link its stack trace lines to `commit`.
    pub fn linkify(&self, text: &str, commit: Option<&str>) -> String {
        self.linker.linkify(text, commit)
    }

    /// Direct access to the memoized storage layer.
    pub fn storage(&self) -> &StorageAccessor {
        &self.storage
    }
}
