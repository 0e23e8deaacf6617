//! Google Cloud Storage JSON API client.
//!
//! Reads objects with `alt=media` and lists one directory level using
//! `delimiter=/`. Only anonymous access is supported, which is how public
//! CI log buckets are served.
//! See: <https://cloud.google.com/storage/docs/json_api>

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{ObjectStore, split_path};
use crate::types::FileStat;
use crate::{HuginnError, Result};

/// Default base URL for the GCS JSON API
pub const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";

/// Client for the GCS JSON API.
#[derive(Clone)]
pub struct GcsClient {
    http: Client,
    base_url: Url,
}

impl GcsClient {
    /// Create a client against the public GCS endpoint.
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            HuginnError::Configuration(format!("invalid GCS base URL {base_url}: {e}"))
        })?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HuginnError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, base_url })
    }

    /// `{base}/storage/v1/b/{bucket}/o[/{object}]`, each part percent-encoded
    /// as a single path segment (so `/` in object names becomes `%2F`).
    fn object_url(&self, bucket: &str, object: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                HuginnError::Configuration(format!(
                    "GCS base URL {} cannot be a base",
                    self.base_url
                ))
            })?;
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "b", bucket, "o"]);
            if let Some(object) = object {
                segments.push(object);
            }
        }
        Ok(url)
    }

    /// Check response status and map to appropriate error.
    fn handle_response_errors(response: &reqwest::Response, path: &str) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        match status.as_u16() {
            404 => Err(HuginnError::NotFound(path.to_string())),
            code => Err(HuginnError::Api {
                status: code,
                message: format!("GCS error for {path}: {status}"),
            }),
        }
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        page_token: Option<&str>,
    ) -> Result<ListResponse> {
        let mut url = self.object_url(bucket, None)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("delimiter", "/");
            query.append_pair(
                "fields",
                "items(name,size,etag,updated),prefixes,nextPageToken",
            );
            if !prefix.is_empty() {
                query.append_pair("prefix", prefix);
            }
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))?;

        Self::handle_response_errors(&response, prefix)?;

        response
            .json()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))
    }
}

#[async_trait]
impl ObjectStore for GcsClient {
    fn name(&self) -> &str {
        "gcs"
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        let (bucket, object) = split_path(path, false)?;
        let mut url = self.object_url(bucket, Some(object))?;
        url.query_pairs_mut().append_pair("alt", "media");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))?;

        Self::handle_response_errors(&response, path)?;

        response
            .bytes()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))
    }

    async fn list(&self, dir: &str) -> Result<Vec<FileStat>> {
        let (bucket, prefix) = split_path(dir, true)?;
        // `logs/job` must not also match `logs/jobber/`.
        let prefix = if prefix.is_empty() || prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{prefix}/")
        };
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_page(bucket, &prefix, page_token.as_deref())
                .await?;

            entries.extend(
                page.prefixes
                    .into_iter()
                    .map(|p| FileStat::dir(format!("/{bucket}/{p}"))),
            );
            entries.extend(
                page.items
                    .into_iter()
                    // The directory's own placeholder object, if one exists.
                    .filter(|item| item.name != prefix)
                    .map(|item| FileStat {
                        filename: format!("/{bucket}/{}", item.name),
                        size: item.size.and_then(|s| s.parse().ok()).unwrap_or(0),
                        is_dir: false,
                        etag: item.etag,
                        updated: item.updated,
                    }),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(entries)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<GcsObject>,
    #[serde(default)]
    prefixes: Vec<String>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct GcsObject {
    name: String,
    /// Decimal string, per the JSON API's uint64 convention.
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    etag: Option<String>,
    #[serde(default)]
    updated: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GcsClient {
        GcsClient::with_base_url("http://127.0.0.1:9", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn object_url_encodes_slashes() {
        let url = client()
            .object_url("kubernetes-jenkins", Some("logs/job/1/started.json"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9/storage/v1/b/kubernetes-jenkins/o/logs%2Fjob%2F1%2Fstarted.json"
        );
    }

    #[test]
    fn bucket_url_without_object() {
        let url = client().object_url("bucket", None).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9/storage/v1/b/bucket/o");
    }

    #[test]
    fn invalid_base_url_rejected() {
        assert!(GcsClient::with_base_url("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn parse_list_response() {
        let json = r#"{
            "prefixes": ["logs/job/1/", "logs/job/2/"],
            "items": [{"name": "logs/job/latest-build.txt", "size": "4"}],
            "nextPageToken": "abc"
        }"#;
        let page: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.prefixes.len(), 2);
        assert_eq!(page.items[0].size.as_deref(), Some("4"));
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
    }
}
