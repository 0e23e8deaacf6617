//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `operation` — memoized operation prefix (e.g. "gs://", "build-details://")
//! - `kind` — storage call: "read" or "list"
//! - `outcome` — shard outcome: "parsed", "missing" or "failed"

/// Total memoized calls answered from the cache.
///
/// Labels: `operation`.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Total memoized calls that had to invoke the wrapped fetch.
///
/// Labels: `operation`.
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Total cache backend failures (the fetch ran uncached).
///
/// Labels: `operation`.
pub const CACHE_ERRORS_TOTAL: &str = "huginn_cache_errors_total";

/// Total calls made against the object store.
///
/// Labels: `kind` ("read" | "list").
pub const STORAGE_CALLS_TOTAL: &str = "huginn_storage_calls_total";

/// Total object store calls that were soft-failed to "absent".
///
/// Labels: `kind` ("read" | "list").
pub const STORAGE_FAILURES_TOTAL: &str = "huginn_storage_failures_total";

/// Total junit shards visited while aggregating a build.
///
/// Labels: `outcome` ("parsed" | "missing" | "failed").
pub const SHARDS_TOTAL: &str = "huginn_shards_total";
