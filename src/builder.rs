//! Builder for memoizing caches.
//!
//! Collects configuration before the wrapped function is known, then builds
//! either an infallible [`MemoCache`] or a fallible [`TryMemoCache`] over it.
//!
//! ## Example
//!
//! ```rust
//! use memokit::builder::MemoBuilder;
//!
//! let cache = MemoBuilder::new(64)
//!     .try_build(|_, n: &u64| n * n)
//!     .unwrap();
//! assert_eq!(*cache.call(7), 49);
//! ```

use std::hash::Hash;

use crate::error::ConfigError;
use crate::memo::{MemoCache, TryMemoCache};
use crate::traits::{Recurse, TryRecurse};

/// Configuration for a memoizing cache, applied by `try_build*`.
#[derive(Debug, Clone)]
pub struct MemoBuilder {
    capacity: usize,
}

impl MemoBuilder {
    /// Starts a builder for a cache holding at most `capacity` ready entries.
    ///
    /// Capacity is validated at build time, not here.
    pub fn new(capacity: usize) -> Self {
        MemoBuilder { capacity }
    }

    /// Builds a [`MemoCache`] over an infallible function.
    pub fn try_build<A, R, F>(&self, func: F) -> Result<MemoCache<A, R, F>, ConfigError>
    where
        A: Clone + Eq + Hash,
        F: Fn(&dyn Recurse<A, R>, &A) -> R,
    {
        MemoCache::try_new(self.capacity, func)
    }

    /// Builds a [`TryMemoCache`] over a fallible function.
    pub fn try_build_fallible<A, R, E, F>(
        &self,
        func: F,
    ) -> Result<TryMemoCache<A, R, E, F>, ConfigError>
    where
        A: Clone + Eq + Hash,
        E: Clone,
        F: Fn(&dyn TryRecurse<A, R, E>, &A) -> Result<R, E>,
    {
        TryMemoCache::try_new(self.capacity, func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_infallible_cache() {
        let cache = MemoBuilder::new(8).try_build(|_, n: &u64| n + 1).unwrap();
        assert_eq!(*cache.call(4), 5);
        assert_eq!(cache.capacity(), 8);
    }

    #[test]
    fn builds_fallible_cache() {
        let cache = MemoBuilder::new(8)
            .try_build_fallible(|_, n: &u64| {
                if *n == 0 {
                    Err("zero".to_string())
                } else {
                    Ok(*n)
                }
            })
            .unwrap();
        assert_eq!(*cache.call(3).unwrap(), 3);
        assert!(cache.call(0).is_err());
    }

    #[test]
    fn zero_capacity_surfaces_at_build_time() {
        let builder = MemoBuilder::new(0);
        assert!(builder.try_build(|_, n: &u64| *n).is_err());
        assert!(builder
            .try_build_fallible(|_, n: &u64| Ok::<_, String>(*n))
            .is_err());
    }
}
