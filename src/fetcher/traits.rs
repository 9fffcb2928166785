//! The tag lookup seam.
//!
//! The cache and enricher only depend on [`TagFetcher`]; concrete lookups
//! (the resource search client, a static map, test doubles) and decorators
//! such as [`RetryingFetcher`](super::RetryingFetcher) all implement it.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::types::{Ocid, TagSet};

/// Source of raw tag sets.
///
/// Any error is treated by the cache as "lookup failed for this key, do
/// not cache". Timeouts should surface as [`FetchError::Transient`].
#[async_trait]
pub trait TagFetcher: Send + Sync {
    /// Fetcher name for logging/debugging.
    fn name(&self) -> &str;

    /// Look up the tags of one resource.
    async fn fetch(&self, id: &Ocid) -> Result<TagSet, FetchError>;
}
