//! Tag lookup implementations.
//!
//! - [`TagFetcher`] — the trait the cache and enricher depend on.
//! - [`ResourceSearchFetcher`] — OCI Resource Search over HTTP.
//! - [`RetryingFetcher`] — decorator retrying transient failures.
//! - [`StaticFetcher`] — fixed in-memory map, for offline runs and tests.

pub mod fixed;
pub mod retry;
pub mod search;
pub mod traits;

pub use fixed::StaticFetcher;
pub use retry::{RetryConfig, RetryingFetcher};
pub use search::{ResourceSearchFetcher, SearchConfig};
pub use traits::TagFetcher;
