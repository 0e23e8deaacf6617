//! Huginn error types

use std::time::Duration;

/// Huginn error types
#[derive(Debug, thiserror::Error)]
pub enum HuginnError {
    // Storage/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),

    // Artifact decoding errors
    #[error("decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document parsed as XML but is not a usable test report
    /// (missing attributes, bad durations, entity declarations).
    #[error("malformed test report: {0}")]
    MalformedReport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Cache backend errors
    #[error("cache backend error: {0}")]
    Cache(String),
}

impl From<quick_xml::events::attributes::AttrError> for HuginnError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        HuginnError::Xml(err.into())
    }
}

impl HuginnError {
    /// Whether this error means the object simply does not exist.
    ///
    /// Everything else (timeouts, 5xx, permission) is still treated as
    /// absent by the storage accessor, but is logged louder.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            HuginnError::NotFound(_) | HuginnError::Api { status: 404, .. }
        )
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;
