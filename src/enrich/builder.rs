//! Builder for configuring enricher instances

use std::sync::Arc;

use super::{EnrichConfig, Enricher};
use crate::cache::{CacheConfig, TagCache};
use crate::fetcher::{
    ResourceSearchFetcher, RetryConfig, RetryingFetcher, SearchConfig, TagFetcher,
};
use crate::{HuginnError, Result};

/// Main entry point for creating enricher instances.
pub struct Huginn;

impl Huginn {
    /// Create a new builder for configuring the enricher.
    pub fn builder() -> HuginnBuilder {
        HuginnBuilder::new()
    }
}

/// Builder for configuring enricher instances.
///
/// ```rust
/// # use huginn::{Huginn, StaticFetcher, CacheConfig};
/// # use std::time::Duration;
/// let enricher = Huginn::builder()
///     .fetcher(StaticFetcher::new())
///     .cache_config(CacheConfig::new().ttl(Duration::from_secs(60)))
///     .build()
///     .unwrap();
/// ```
pub struct HuginnBuilder {
    fetcher: Option<Arc<dyn TagFetcher>>,
    search: Option<SearchConfig>,
    retry: Option<RetryConfig>,
    cache: Option<Arc<TagCache>>,
    cache_config: CacheConfig,
    config: EnrichConfig,
}

impl HuginnBuilder {
    pub fn new() -> Self {
        Self {
            fetcher: None,
            search: None,
            retry: None,
            cache: None,
            cache_config: CacheConfig::default(),
            config: EnrichConfig::default(),
        }
    }

    /// Use a custom tag fetcher.
    pub fn fetcher(self, fetcher: impl TagFetcher + 'static) -> Self {
        self.shared_fetcher(Arc::new(fetcher))
    }

    /// Use an already shared tag fetcher.
    pub fn shared_fetcher(mut self, fetcher: Arc<dyn TagFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Fetch tags through OCI Resource Search (ignored if a fetcher is set).
    pub fn search(mut self, config: SearchConfig) -> Self {
        self.search = Some(config);
        self
    }

    /// Retry transient lookup failures.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Share an existing cache (takes precedence over [`cache_config`](Self::cache_config)).
    pub fn cache(mut self, cache: Arc<TagCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Capacity and TTL of a newly created cache.
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Enrichment settings.
    pub fn config(mut self, config: EnrichConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Enricher> {
        let fetcher: Arc<dyn TagFetcher> = match (self.fetcher, self.search) {
            (Some(fetcher), _) => fetcher,
            (None, Some(search)) => Arc::new(ResourceSearchFetcher::new(&search)?),
            (None, None) => {
                return Err(HuginnError::Configuration(
                    "no tag fetcher configured".to_string(),
                ));
            }
        };
        let fetcher: Arc<dyn TagFetcher> = match self.retry {
            Some(retry) if retry.max_attempts > 1 => Arc::new(RetryingFetcher::new(fetcher, retry)),
            _ => fetcher,
        };
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(TagCache::new(&self.cache_config)));
        Ok(Enricher::new(self.config, cache, fetcher))
    }
}

impl Default for HuginnBuilder {
    fn default() -> Self {
        Self::new()
    }
}
