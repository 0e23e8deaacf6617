//! Build result types.
//!
//! Records assembled from a build's `started.json`, `finished.json` and
//! junit shards.

use serde::{Deserialize, Serialize};

/// Contents of a build's `started.json`.
///
/// Only `version` and `timestamp` are interpreted; every other field is
/// preserved verbatim in `extra` for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartedInfo {
    /// Version string of the code under test, e.g. `v1.3.0-alpha.1+a1b2c3d`.
    #[serde(default)]
    pub version: Option<String>,
    /// Unix timestamp (seconds) at which the build started.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StartedInfo {
    /// Commit identifier: the last `+`-separated segment of `version`.
    ///
    /// A version without any `+` names no commit.
    ///
    /// ```rust
    /// # use huginn::StartedInfo;
    /// let started: StartedInfo =
    ///     serde_json::from_str(r#"{"version": "v1.2.0+abc123"}"#).unwrap();
    /// assert_eq!(started.commit(), Some("abc123"));
    /// ```
    pub fn commit(&self) -> Option<&str> {
        self.version
            .as_deref()
            .and_then(|v| v.rsplit_once('+'))
            .map(|(_, commit)| commit)
            .filter(|c| !c.is_empty())
    }
}

/// Contents of a build's `finished.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedInfo {
    /// Overall result, e.g. `SUCCESS` or `FAILURE`.
    #[serde(default)]
    pub result: Option<String>,
    /// Unix timestamp (seconds) at which the build finished.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single failed test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Test case name.
    pub name: String,
    /// Duration in seconds.
    pub duration: f64,
    /// Body of the `<failure>` element, if any.
    pub detail: Option<String>,
}

impl FailureRecord {
    pub fn new(name: impl Into<String>, duration: f64, detail: Option<String>) -> Self {
        Self {
            name: name.into(),
            duration,
            detail,
        }
    }
}

/// Aggregated result of one build.
///
/// Only exists when both `started.json` and `finished.json` were readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildDetails {
    pub started: StartedInfo,
    pub finished: FinishedInfo,
    /// Failures in shard order, then document order within a shard.
    pub failures: Vec<FailureRecord>,
}

impl BuildDetails {
    /// Build duration in seconds, when both timestamps are known.
    pub fn duration_secs(&self) -> Option<i64> {
        Some(self.finished.timestamp? - self.started.timestamp?)
    }
}
