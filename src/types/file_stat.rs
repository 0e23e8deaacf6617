//! Directory listing entries.

use serde::{Deserialize, Serialize};

/// One entry of a non-recursive object listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Full storage path, `/<bucket>/<object>`. Directories end in `/`.
    pub filename: String,
    /// Object size in bytes (0 for directories).
    pub size: u64,
    /// Whether this entry is a common prefix rather than an object.
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Last modification time as reported by the store (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

impl FileStat {
    /// A plain object entry.
    pub fn file(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            size,
            is_dir: false,
            etag: None,
            updated: None,
        }
    }

    /// A directory (common prefix) entry.
    pub fn dir(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            size: 0,
            is_dir: true,
            etag: None,
            updated: None,
        }
    }

    /// Last path segment, without any trailing `/`.
    pub fn name(&self) -> &str {
        self.filename
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}
