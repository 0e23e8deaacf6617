//! Build detail aggregation.
//!
//! A build directory holds:
//!
//! ```text
//! /<bucket>/<prefix>/<job>/<build>/started.json
//! /<bucket>/<prefix>/<job>/<build>/finished.json
//! /<bucket>/<prefix>/<job>/<build>/artifacts/junit_01.xml
//! /<bucket>/<prefix>/<job>/<build>/artifacts/junit_02.xml   (optionally gzipped)
//! ...
//! ```
//!
//! [`BuildDetailAggregator`] reads both markers, then walks the junit shards
//! from `01` upwards until the first one that is missing or unreadable, and
//! caches the assembled [`BuildDetails`]. Shards must be contiguous: a gap
//! ends the walk, so failures in later shards are not reported.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::Result;
use crate::cache::{CacheConfig, Fetch, MemoCache, MemoPolicy, Memoized};
use crate::decompress::decompress;
use crate::junit;
use crate::storage::StorageAccessor;
use crate::telemetry;
use crate::types::{BuildDetails, BuildPath, FailureRecord};

/// Cache prefix for aggregated build details.
pub const DETAILS_PREFIX: &str = "build-details://";

/// Shard indices are tried from 1 up to, but not including, this bound.
pub const MAX_SHARDS: u32 = 99;

/// Path of the `index`th junit shard of a build directory.
pub fn shard_path(build_dir: &str, index: u32) -> String {
    format!("{build_dir}/artifacts/junit_{index:02}.xml")
}

/// Decompress and parse one shard.
pub fn decode_shard(raw: &[u8]) -> Result<Vec<FailureRecord>> {
    let xml = decompress(raw)?;
    junit::parse_failures(&xml)
}

fn parse_marker<T: DeserializeOwned>(build_dir: &str, name: &str, raw: &[u8]) -> Option<T> {
    match serde_json::from_slice(raw) {
        Ok(info) => Some(info),
        Err(e) => {
            warn!(build_dir, name, error = %e, "malformed build marker");
            None
        }
    }
}

/// Assemble the details of one build directory, uncached.
///
/// Returns `None` when either marker is missing, empty or malformed.
pub async fn collect(storage: &StorageAccessor, build_dir: &str) -> Option<BuildDetails> {
    let started = storage.read(&format!("{build_dir}/started.json")).await;
    let finished = storage.read(&format!("{build_dir}/finished.json")).await;
    let (Some(started), Some(finished)) = (
        started.filter(|b| !b.is_empty()),
        finished.filter(|b| !b.is_empty()),
    ) else {
        debug!(build_dir, "build has not both started and finished");
        return None;
    };

    let started = parse_marker(build_dir, "started.json", &started)?;
    let finished = parse_marker(build_dir, "finished.json", &finished)?;

    let mut failures = Vec::new();
    let mut shards = 0;
    for index in 1..MAX_SHARDS {
        let path = shard_path(build_dir, index);
        let Some(raw) = storage.read(&path).await else {
            metrics::counter!(telemetry::SHARDS_TOTAL, "outcome" => "missing").increment(1);
            debug!(path = %path, "no more junit shards");
            break;
        };
        match decode_shard(&raw) {
            Ok(records) => {
                metrics::counter!(telemetry::SHARDS_TOTAL, "outcome" => "parsed").increment(1);
                debug!(path = %path, failures = records.len(), "parsed junit shard");
                failures.extend(records);
                shards += 1;
            }
            Err(e) => {
                metrics::counter!(telemetry::SHARDS_TOTAL, "outcome" => "failed").increment(1);
                warn!(
                    path = %path,
                    error = %e,
                    "unreadable junit shard, ignoring it and any later shards"
                );
                break;
            }
        }
    }

    info!(
        build_dir,
        shards,
        failures = failures.len(),
        "aggregated build details"
    );
    Some(BuildDetails {
        started,
        finished,
        failures,
    })
}

struct CollectDetails {
    storage: Arc<StorageAccessor>,
}

#[async_trait]
impl Fetch for CollectDetails {
    type Output = Option<BuildDetails>;

    async fn fetch(&self, build_dir: &str) -> Option<BuildDetails> {
        collect(&self.storage, build_dir).await
    }
}

/// Memoized build detail aggregation.
pub struct BuildDetailAggregator {
    inner: Memoized<CollectDetails>,
}

impl BuildDetailAggregator {
    pub fn new(storage: Arc<StorageAccessor>, cache: MemoCache, config: &CacheConfig) -> Self {
        Self {
            inner: Memoized::new(
                cache,
                MemoPolicy::new(
                    DETAILS_PREFIX,
                    config.details_ttl,
                    config.details_negative_ttl,
                ),
                CollectDetails { storage },
            ),
        }
    }

    /// Details of a build, or `None` if it is unavailable.
    pub async fn aggregate(&self, build: &BuildPath) -> Option<BuildDetails> {
        self.inner.call(build.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_paths_are_zero_padded() {
        assert_eq!(shard_path("/b/j/1", 1), "/b/j/1/artifacts/junit_01.xml");
        assert_eq!(shard_path("/b/j/1", 42), "/b/j/1/artifacts/junit_42.xml");
        assert_eq!(
            shard_path("/b/j/1", MAX_SHARDS - 1),
            "/b/j/1/artifacts/junit_98.xml"
        );
    }

    #[test]
    fn decode_plain_shard() {
        let xml = br#"<testsuite><testcase name="a" time="1"><failure>x</failure></testcase></testsuite>"#;
        let records = decode_shard(xml).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn decode_garbage_shard_fails() {
        assert!(decode_shard(&[0x1f, 0x8b, 0xff]).is_err());
        assert!(decode_shard(b"").is_err());
    }
}
