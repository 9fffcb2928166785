//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `status` — outcome of a lookup or of a processed record

/// Tag cache hits.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Tag cache misses (each miss either starts or joins a lookup).
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Callers that waited on a lookup already in flight for the same key.
pub const COALESCED_TOTAL: &str = "huginn_coalesced_total";

/// Tag lookups issued to the fetcher.
///
/// Labels: `status` ("ok" | "error").
pub const FETCHES_TOTAL: &str = "huginn_fetches_total";

/// Tag lookup duration in seconds.
pub const FETCH_DURATION_SECONDS: &str = "huginn_fetch_duration_seconds";

/// Retry attempts after transient lookup failures (not counting the first try).
pub const RETRIES_TOTAL: &str = "huginn_retries_total";

/// Records processed by the enricher.
///
/// Labels: `status` ("enriched" | "unchanged" | "conflict").
pub const RECORDS_TOTAL: &str = "huginn_records_total";
