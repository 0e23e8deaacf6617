//! Job and build listings.
//!
//! Both are derived from one memoized directory listing and ordered with
//! [`natural_key`], so build `10` follows build `9`.

use serde::{Deserialize, Serialize};

use crate::sort::natural_key;
use crate::storage::StorageAccessor;

/// A child directory of a job or prefix listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Last path segment, e.g. `1234` or `ci-kubernetes-e2e-gce`.
    pub name: String,
    /// Full storage path, ending in `/`.
    pub path: String,
}

/// Builds of the job at `job_dir`, newest first.
///
/// Only numeric subdirectories count as builds.
pub async fn list_builds(storage: &StorageAccessor, job_dir: &str) -> Vec<DirEntry> {
    let mut builds: Vec<DirEntry> = subdirectories(storage, job_dir)
        .await
        .into_iter()
        .filter(|e| e.name.bytes().all(|b| b.is_ascii_digit()))
        .collect();
    builds.sort_by_cached_key(|e| std::cmp::Reverse(natural_key(&e.name)));
    builds
}

/// Jobs under the prefix directory `prefix_dir`, in natural order.
pub async fn list_jobs(storage: &StorageAccessor, prefix_dir: &str) -> Vec<DirEntry> {
    let mut jobs = subdirectories(storage, prefix_dir).await;
    jobs.sort_by_cached_key(|e| natural_key(&e.name));
    jobs
}

async fn subdirectories(storage: &StorageAccessor, dir: &str) -> Vec<DirEntry> {
    storage
        .list(dir)
        .await
        .into_iter()
        .filter(|stat| stat.is_dir && !stat.name().is_empty())
        .map(|stat| DirEntry {
            name: stat.name().to_string(),
            path: stat.filename,
        })
        .collect()
}
