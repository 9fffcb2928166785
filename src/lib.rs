//! Huginn - tag enrichment for OCI log payloads
//!
//! Finds Oracle Cloud Identifiers (OCIDs) anywhere in a JSON log payload,
//! looks up each resource's tags through a shared TTL cache, and writes an
//! `OCID → tags` mapping back into the payload at a configurable location.
//!
//! The pipeline per record is:
//!
//! 1. [`Extractor`] — distinct OCIDs in first-encounter order, optionally
//!    restricted to certain keys.
//! 2. [`TagCache`] — bounded LRU + TTL cache in front of a [`TagFetcher`],
//!    with one in-flight lookup per identifier.
//! 3. [`Aggregator`] — keeps the selected tag categories.
//! 4. [`inject`] — places the mapping along a dot path.
//!
//! [`Enricher`] ties these together and is what callers normally use.
//!
//! # Example
//!
//! ```rust
//! use huginn::{Huginn, StaticFetcher, TagCategory, TagSet};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let mut freeform = huginn::Tags::new();
//!     freeform.insert("env".into(), json!("prod"));
//!     let fetcher = StaticFetcher::new().with(
//!         "ocid1.instance.oc1.phx.aaaa".parse()?,
//!         TagSet::new().with(TagCategory::Freeform, freeform),
//!     );
//!
//!     let enricher = Huginn::builder().fetcher(fetcher).build()?;
//!     let out = enricher
//!         .enrich(json!({"resourceId": "ocid1.instance.oc1.phx.aaaa"}))
//!         .await;
//!
//!     assert_eq!(
//!         out["metadata"]["ocid1.instance.oc1.phx.aaaa"]["freeform"]["env"],
//!         "prod"
//!     );
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod inject;
pub mod telemetry;
pub mod types;
mod version;

// Re-export main types at crate root
pub use aggregate::Aggregator;
pub use cache::{CacheConfig, SingleFlight, TagCache};
pub use config::Settings;
pub use enrich::{EnrichConfig, Enricher, Huginn, HuginnBuilder, RecordOutcome};
pub use error::{FetchError, HuginnError, InjectionError, Result};
pub use extract::Extractor;
pub use fetcher::{
    ResourceSearchFetcher, RetryConfig, RetryingFetcher, SearchConfig, StaticFetcher, TagFetcher,
};
pub use inject::inject;
pub use types::{InsertionPath, Ocid, OcidGrammar, TagCategory, TagSet, Tags};
pub use version::{PKG_VERSION, version_string};
