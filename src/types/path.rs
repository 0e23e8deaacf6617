//! Build paths and the bucket allow-list.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::{HuginnError, Result};

/// Bucket served when no allow-list is configured.
pub const DEFAULT_BUCKET: &str = "kubernetes-jenkins";

/// Storage path of one build's artifact directory:
/// `/<bucket>/<prefix...>/<job>/<build>`.
///
/// Never carries a trailing slash; artifact paths are formed by appending
/// `/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BuildPath(String);

impl BuildPath {
    /// Assemble a build path from its parts.
    ///
    /// `prefix` may be empty or a `/`-terminated sequence of directories.
    ///
    /// ```rust
    /// # use huginn::BuildPath;
    /// let path = BuildPath::new("kubernetes-jenkins", "logs/", "e2e-gce", "1234").unwrap();
    /// assert_eq!(path.as_str(), "/kubernetes-jenkins/logs/e2e-gce/1234");
    /// ```
    pub fn new(bucket: &str, prefix: &str, job: &str, build: &str) -> Result<Self> {
        let prefix = prefix.trim_matches('/');
        let joined = if prefix.is_empty() {
            format!("/{bucket}/{job}/{build}")
        } else {
            format!("/{bucket}/{prefix}/{job}/{build}")
        };
        Self::parse(&joined)
    }

    /// Parse and validate a path such as `/bucket/logs/job/123/`.
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        if segments.len() < 3 {
            return Err(HuginnError::InvalidPath(format!(
                "{path}: expected /<bucket>/<job>/<build>"
            )));
        }
        if let Some(bad) = segments.iter().find(|s| !is_word_segment(s)) {
            return Err(HuginnError::InvalidPath(format!(
                "{path}: invalid segment '{bad}'"
            )));
        }
        let build = segments[segments.len() - 1];
        if !build.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HuginnError::InvalidPath(format!(
                "{path}: build '{build}' is not numeric"
            )));
        }
        Ok(Self(format!("/{}", segments.join("/"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bucket name (first segment).
    pub fn bucket(&self) -> &str {
        self.segments().next().unwrap_or_default()
    }

    /// Job name (second-to-last segment).
    pub fn job(&self) -> &str {
        self.segments().rev().nth(1).unwrap_or_default()
    }

    /// Build number (last segment).
    pub fn build(&self) -> &str {
        self.segments().next_back().unwrap_or_default()
    }

    fn segments(&self) -> std::str::Split<'_, char> {
        self.0[1..].split('/')
    }
}

impl fmt::Display for BuildPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BuildPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `[-\w]+`
fn is_word_segment(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_word_char)
}

fn is_word_char(c: char) -> bool {
    c == '-' || c == '_' || c.is_alphanumeric()
}

/// Set of buckets that may be read at all.
///
/// Checked before any storage access; anything else is reported as not
/// found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketAllowList {
    buckets: HashSet<String>,
}

impl BucketAllowList {
    pub fn new<I, S>(buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            buckets: buckets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, bucket: &str) -> bool {
        self.buckets.contains(bucket)
    }

    /// Fail with [`HuginnError::NotFound`] for buckets outside the list.
    pub fn check(&self, bucket: &str) -> Result<()> {
        if self.contains(bucket) {
            Ok(())
        } else {
            Err(HuginnError::NotFound(format!("bucket '{bucket}'")))
        }
    }

    /// Check the bucket of a `/<bucket>/...` storage path.
    pub fn check_path(&self, path: &str) -> Result<()> {
        let bucket = path
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();
        self.check(bucket)
    }
}

impl Default for BucketAllowList {
    fn default() -> Self {
        Self::new([DEFAULT_BUCKET])
    }
}
