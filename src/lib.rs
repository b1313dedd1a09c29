//! memokit: bounded, concurrency-safe memoization primitives.
//!
//! Wraps a pure function in a keyed result cache with LRU eviction and
//! in-flight de-duplication. See `DESIGN.md` for internal architecture
//! and invariants.

pub mod builder;
pub mod ds;
pub mod error;
pub mod memo;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod traits;
