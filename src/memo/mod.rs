//! Memoizing cache types.
//!
//! [`MemoCache`] wraps an infallible function, [`TryMemoCache`] a fallible
//! one; both share the state machine in `core` (slot map + recency index +
//! per-key in-flight handles).

pub mod cache;
pub(crate) mod core;
pub mod try_cache;

pub use cache::MemoCache;
pub use try_cache::TryMemoCache;
