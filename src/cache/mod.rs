//! Caching subsystem.
//!
//! - [`TagCache`] — bounded LRU + TTL store of tag sets keyed by OCID,
//!   shared across concurrent enrichment requests.
//! - [`SingleFlight`] — per-key registry of in-flight lookups, used by
//!   the tag cache so that one missing key causes one fetch.

pub mod singleflight;
pub mod tags;

pub use singleflight::SingleFlight;
pub use tags::{CacheConfig, MAX_TTL, TagCache};
