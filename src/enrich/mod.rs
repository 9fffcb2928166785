//! Payload enrichment.
//!
//! [`Enricher`] composes the pipeline for each record of a payload:
//! extract identifiers → resolve each through the shared [`TagCache`] →
//! aggregate → inject the `OCID → tags` mapping.
//!
//! A payload is either a single record or an array of records; each array
//! element is enriched independently from its own content.
//!
//! # Degradation
//!
//! - A record without identifiers is returned unchanged (no field added).
//! - A failed lookup keeps the identifier in the mapping with an empty tag
//!   set; the request continues.
//! - A record whose insertion path collides with a non-object value is
//!   returned unchanged.
//!
//! Only input that is not JSON at all fails the request
//! ([`Enricher::enrich_str`]).

mod builder;

pub use builder::{Huginn, HuginnBuilder};

use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::Result;
use crate::aggregate::Aggregator;
use crate::cache::TagCache;
use crate::extract::Extractor;
use crate::fetcher::TagFetcher;
use crate::inject::inject;
use crate::telemetry;
use crate::types::{InsertionPath, Ocid, TagSet};

/// Default name of the injected field.
pub const DEFAULT_OUTPUT_FIELD: &str = "metadata";

/// Per-request enrichment settings.
///
/// ```rust
/// # use huginn::{Aggregator, EnrichConfig, Extractor, InsertionPath, TagCategory};
/// let config = EnrichConfig::new()
///     .output_field("tags")
///     .insertion_path(InsertionPath::parse("logContent.oracle").unwrap())
///     .extractor(Extractor::new().key_filter(["resourceId"]))
///     .aggregator(Aggregator::new().categories([TagCategory::Defined]));
/// assert_eq!(config.output_field, "tags");
/// ```
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Key under which the metadata mapping is stored. Default: `metadata`.
    pub output_field: String,
    /// Location of the output field inside each record. Default: root.
    pub insertion_path: InsertionPath,
    pub extractor: Extractor,
    pub aggregator: Aggregator,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            output_field: DEFAULT_OUTPUT_FIELD.to_string(),
            insertion_path: InsertionPath::root(),
            extractor: Extractor::default(),
            aggregator: Aggregator::default(),
        }
    }
}

impl EnrichConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_field(mut self, field: impl Into<String>) -> Self {
        self.output_field = field.into();
        self
    }

    pub fn insertion_path(mut self, path: InsertionPath) -> Self {
        self.insertion_path = path;
        self
    }

    pub fn extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = aggregator;
        self
    }
}

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Metadata was injected.
    Enriched,
    /// No identifiers; the record is untouched.
    Unchanged,
    /// The insertion path collided with a non-object; the record is untouched.
    Conflict,
}

impl RecordOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Enriched => "enriched",
            Self::Unchanged => "unchanged",
            Self::Conflict => "conflict",
        }
    }
}

/// Enriches payloads using a shared tag cache and fetcher.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct Enricher {
    config: Arc<EnrichConfig>,
    cache: Arc<TagCache>,
    fetcher: Arc<dyn TagFetcher>,
}

impl Enricher {
    /// Assemble an enricher from its parts. See also [`Huginn::builder`].
    pub fn new(config: EnrichConfig, cache: Arc<TagCache>, fetcher: Arc<dyn TagFetcher>) -> Self {
        Self {
            config: Arc::new(config),
            cache,
            fetcher,
        }
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<TagCache> {
        &self.cache
    }

    /// Parse `input` as JSON and enrich it.
    ///
    /// Fails only when `input` is not valid JSON.
    pub async fn enrich_str(&self, input: &str) -> Result<Value> {
        let payload: Value = serde_json::from_str(input)?;
        Ok(self.enrich(payload).await)
    }

    /// Byte-slice variant of [`enrich_str`](Self::enrich_str).
    pub async fn enrich_slice(&self, input: &[u8]) -> Result<Value> {
        let payload: Value = serde_json::from_slice(input)?;
        Ok(self.enrich(payload).await)
    }

    /// Enrich a single record or every element of an array of records.
    pub async fn enrich(&self, payload: Value) -> Value {
        match payload {
            Value::Array(records) => {
                let mut out = Vec::with_capacity(records.len());
                for mut record in records {
                    self.enrich_record(&mut record).await;
                    out.push(record);
                }
                Value::Array(out)
            }
            mut record => {
                self.enrich_record(&mut record).await;
                record
            }
        }
    }

    /// Enrich one record in place.
    pub async fn enrich_record(&self, record: &mut Value) -> RecordOutcome {
        let outcome = match self.metadata_for(record).await {
            None => RecordOutcome::Unchanged,
            Some(metadata) => match inject(
                record,
                &self.config.insertion_path,
                &self.config.output_field,
                Value::Object(metadata),
            ) {
                Ok(()) => RecordOutcome::Enriched,
                Err(e) => {
                    warn!(
                        path = %self.config.insertion_path,
                        error = %e,
                        "cannot place metadata, record left unchanged"
                    );
                    RecordOutcome::Conflict
                }
            },
        };
        metrics::counter!(telemetry::RECORDS_TOTAL, "status" => outcome.as_str()).increment(1);
        outcome
    }

    /// The `OCID → tags` mapping for `record`, or `None` if it has no
    /// identifiers.
    ///
    /// Any previous output at the configured location is ignored.
    pub async fn metadata_for(&self, record: &Value) -> Option<Map<String, Value>> {
        let ids = self.config.extractor.extract_excluding(
            record,
            &self.config.insertion_path,
            &self.config.output_field,
        );
        if ids.is_empty() {
            return None;
        }
        debug!(count = ids.len(), "resolving identifiers");
        Some(self.resolve_all(&ids).await)
    }

    async fn resolve_all(&self, ids: &[Ocid]) -> Map<String, Value> {
        let lookups = ids
            .iter()
            .map(|id| self.cache.resolve_with(id, &self.fetcher));
        let results = join_all(lookups).await;

        ids.iter()
            .zip(results)
            .map(|(id, result)| {
                let tags = match result {
                    Ok(raw) => self.config.aggregator.aggregate(&raw),
                    Err(e) => {
                        warn!(
                            ocid = %id,
                            fetcher = self.fetcher.name(),
                            error = %e,
                            "tag lookup failed, using empty tag set"
                        );
                        TagSet::new()
                    }
                };
                (id.to_string(), tags.to_value())
            })
            .collect()
    }
}
