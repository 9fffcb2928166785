//! OCI Resource Search client.
//!
//! Looks up one resource per request with a structured query
//! (`query all resources where identifier = '<ocid>'`) and reads the
//! `freeformTags`, `definedTags` and `systemTags` of the matching item.
//!
//! Requests are not signed. Point the endpoint at a signing proxy or an
//! already-authorised gateway; static headers can be added through
//! [`SearchConfig::header`].

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TagFetcher;
use crate::error::FetchError;
use crate::types::{Ocid, TagCategory, TagSet, Tags};
use crate::{HuginnError, Result};

/// API path of the search operation, relative to the endpoint.
pub const SEARCH_PATH: &str = "/20180409/resources";

/// Connection settings for [`ResourceSearchFetcher`].
///
/// ```rust
/// # use huginn::SearchConfig;
/// # use std::time::Duration;
/// let config = SearchConfig::new("https://query.us-phoenix-1.oci.oraclecloud.com")
///     .timeout(Duration::from_secs(10))
///     .header("x-proxy-token", "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Base URL, without the API path.
    pub endpoint: String,
    /// Per-request timeout. Default: 30s.
    pub timeout: Duration,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl SearchConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(30),
            headers: BTreeMap::new(),
        }
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredSearchDetails {
    #[serde(rename = "type")]
    kind: &'static str,
    query: String,
    matching_context_type: &'static str,
}

impl StructuredSearchDetails {
    fn for_ocid(id: &Ocid) -> Self {
        // Validated OCIDs never contain quotes.
        Self {
            kind: "Structured",
            query: format!("query all resources where identifier = '{id}'"),
            matching_context_type: "NONE",
        }
    }
}

#[derive(Deserialize)]
struct ResourceSummaryCollection {
    #[serde(default)]
    items: Vec<ResourceSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceSummary {
    identifier: String,
    #[serde(default)]
    freeform_tags: Option<Tags>,
    #[serde(default)]
    defined_tags: Option<Tags>,
    #[serde(default)]
    system_tags: Option<Tags>,
}

impl From<ResourceSummary> for TagSet {
    fn from(item: ResourceSummary) -> Self {
        let mut tags = TagSet::new();
        tags.set(TagCategory::Freeform, item.freeform_tags);
        tags.set(TagCategory::Defined, item.defined_tags);
        tags.set(TagCategory::System, item.system_tags);
        tags
    }
}

/// Fetches tags through the OCI Resource Search API.
pub struct ResourceSearchFetcher {
    client: reqwest::Client,
    url: String,
}

impl ResourceSearchFetcher {
    /// Build a client for `config`.
    ///
    /// Fails on malformed header names or values.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                HuginnError::Configuration(format!("invalid header name '{name}': {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                HuginnError::Configuration(format!("invalid value for header '{name}': {e}"))
            })?;
            headers.insert(name, value);
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| HuginnError::Configuration(format!("failed to build HTTP client: {e}")))?;
        let url = format!("{}{SEARCH_PATH}", config.endpoint.trim_end_matches('/'));
        Ok(Self { client, url })
    }
}

#[async_trait]
impl TagFetcher for ResourceSearchFetcher {
    fn name(&self) -> &str {
        "resource-search"
    }

    async fn fetch(&self, id: &Ocid) -> std::result::Result<TagSet, FetchError> {
        let response = self
            .client
            .post(&self.url)
            .json(&StructuredSearchDetails::for_ocid(id))
            .send()
            .await
            .map_err(|e| FetchError::Transient(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let message = response.text().await.unwrap_or_default();
            return Err(classify(status, retry_after, id, message));
        }

        // A body that fails to arrive (timeout, reset) is a transport problem.
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transient(format!("reading search response failed: {e}")))?;
        let collection: ResourceSummaryCollection = serde_json::from_slice(&body)
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
        let matched = collection
            .items
            .into_iter()
            .find(|item| item.identifier == id.as_str());
        if matched.is_none() {
            debug!(ocid = %id, "search returned no matching resource");
        }
        Ok(matched.map(TagSet::from).unwrap_or_default())
    }
}

fn classify(
    status: StatusCode,
    retry_after: Option<Duration>,
    id: &Ocid,
    message: String,
) -> FetchError {
    match status {
        StatusCode::NOT_FOUND => FetchError::NotFound(id.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::AccessDenied(message),
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited { retry_after },
        s if s.is_server_error() => FetchError::Transient(format!("HTTP {}: {message}", s.as_u16())),
        s => FetchError::Api {
            status: s.as_u16(),
            message,
        },
    }
}
