//! Operation counters for the memoization layer (feature `metrics`).
//!
//! Counters live inside the cache's state lock, so incrementing them costs a
//! plain `u64` add on a path that already holds the lock. Reading goes
//! through a [`MemoMetricsSnapshot`], a detached `Copy` of every counter plus
//! the gauges captured at snapshot time.

/// Mutable counters, embedded in the cache state.
#[derive(Debug, Default)]
pub(crate) struct MemoMetrics {
    pub call_hits: u64,
    pub call_misses: u64,
    pub pending_waits: u64,
    pub failures: u64,
    pub abandons: u64,
    pub evicted_entries: u64,
    pub invalidations: u64,
}

/// Point-in-time copy of the counters, plus gauges.
///
/// `call_misses` counts claimed computations, so `call_misses == failures +
/// abandons + completions` over the cache's lifetime. `pending_waits` counts
/// callers that found a computation already in flight and blocked on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoMetricsSnapshot {
    pub call_hits: u64,
    pub call_misses: u64,
    pub pending_waits: u64,
    pub failures: u64,
    pub abandons: u64,
    pub evicted_entries: u64,
    pub invalidations: u64,

    // gauges captured at snapshot time
    pub entry_count: usize,
    pub ready_count: usize,
    pub capacity: usize,
}
