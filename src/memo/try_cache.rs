//! Memoizing cache for fallible functions.
//!
//! [`TryMemoCache`] is the `Result`-returning counterpart of
//! [`MemoCache`](crate::memo::MemoCache): the wrapped function may fail, the
//! failure is propagated verbatim to the caller and every co-waiter, and it
//! is never cached — the next call for the same key retries the function
//! fresh. `E: Clone` because each waiter receives its own copy of the error.
//!
//! Success and failure leave the cache equally usable; no error poisons
//! other keys or later generations.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::memo::core::{CompletionGuard, Lookup, MemoShared};
#[cfg(feature = "metrics")]
use crate::metrics::MemoMetricsSnapshot;
use crate::traits::{Memoized, TryRecurse};

/// Bounded, concurrency-safe memoization of a fallible pure function.
///
/// # Example
///
/// ```
/// use memokit::memo::TryMemoCache;
///
/// let cache = TryMemoCache::new(16, |_, n: &u32| {
///     if *n == 0 {
///         Err("zero is not a valid input".to_string())
///     } else {
///         Ok(100 / n)
///     }
/// });
///
/// assert_eq!(*cache.call(4).unwrap(), 25);
/// assert!(cache.call(0).is_err());
/// // The failure was not cached
/// assert_eq!(cache.len(), 1);
/// ```
pub struct TryMemoCache<A, R, E, F>
where
    A: Clone + Eq + Hash,
{
    shared: MemoShared<A, R, E>,
    func: F,
}

impl<A, R, E, F> TryMemoCache<A, R, E, F>
where
    A: Clone + Eq + Hash,
    E: Clone,
    F: Fn(&dyn TryRecurse<A, R, E>, &A) -> Result<R, E>,
{
    /// Creates a memoizing cache over `func` holding at most `capacity`
    /// ready entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`try_new`](Self::try_new) to handle
    /// the configuration error instead.
    pub fn new(capacity: usize, func: F) -> Self {
        match Self::try_new(capacity, func) {
            Ok(cache) => cache,
            Err(err) => panic!("TryMemoCache::new: {err}"),
        }
    }

    /// Fallible constructor: rejects a zero capacity with [`ConfigError`].
    pub fn try_new(capacity: usize, func: F) -> Result<Self, ConfigError> {
        Ok(TryMemoCache {
            shared: MemoShared::try_new(capacity)?,
            func,
        })
    }

    /// Returns the memoized result for `args`, or the function's error.
    ///
    /// Hit, wait, and miss behave as in
    /// [`MemoCache::call`](crate::memo::MemoCache::call). On `Err` the
    /// pending entry is removed — the failure is delivered to the caller and
    /// every thread waiting on this key, nothing is stored, and the next
    /// call retries `f`. The cache never retries on its own.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    ///
    /// use memokit::memo::TryMemoCache;
    ///
    /// let attempts = AtomicUsize::new(0);
    /// let cache = TryMemoCache::new(8, |_, n: &u32| {
    ///     if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
    ///         Err("transient".to_string())
    ///     } else {
    ///         Ok(n * 2)
    ///     }
    /// });
    ///
    /// assert_eq!(cache.call(21), Err("transient".to_string()));
    /// assert_eq!(*cache.call(21).unwrap(), 42); // retried
    /// assert_eq!(attempts.load(Ordering::SeqCst), 2);
    /// ```
    pub fn call(&self, args: A) -> Result<Arc<R>, E> {
        match self.shared.lookup_or_claim(&args) {
            Lookup::Hit(value) => Ok(value),
            Lookup::Wait(inflight) => inflight.wait(),
            Lookup::Claimed(inflight) => {
                let guard = CompletionGuard::new(&self.shared, &args, &inflight);
                let outcome = (self.func)(self as &dyn TryRecurse<A, R, E>, &args);
                guard.disarm();
                match outcome {
                    Ok(value) => {
                        let value = Arc::new(value);
                        self.shared.complete(&args, &inflight, Arc::clone(&value));
                        Ok(value)
                    },
                    Err(err) => {
                        self.shared.fail(&args, &inflight, err.clone());
                        Err(err)
                    },
                }
            },
        }
    }

    /// Removes any entry for `args` regardless of state. Returns `false` if
    /// absent.
    pub fn invalidate(&self, args: &A) -> bool {
        self.shared.invalidate(args)
    }

    /// Returns the current entry count, pending entries included.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.shared.len() == 0
    }

    /// Returns the number of ready (evictable) entries.
    pub fn ready_len(&self) -> usize {
        self.shared.ready_len()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Removes all entries. In-flight computations still resolve for their
    /// waiters but are no longer stored.
    pub fn clear(&self) {
        self.shared.clear()
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> MemoMetricsSnapshot {
        self.shared.metrics_snapshot()
    }
}

impl<A, R, E, F> TryRecurse<A, R, E> for TryMemoCache<A, R, E, F>
where
    A: Clone + Eq + Hash,
    E: Clone,
    F: Fn(&dyn TryRecurse<A, R, E>, &A) -> Result<R, E>,
{
    fn call(&self, args: A) -> Result<Arc<R>, E> {
        TryMemoCache::call(self, args)
    }
}

impl<A, R, E, F> Memoized<A> for TryMemoCache<A, R, E, F>
where
    A: Clone + Eq + Hash,
    E: Clone,
    F: Fn(&dyn TryRecurse<A, R, E>, &A) -> Result<R, E>,
{
    type Output = Result<Arc<R>, E>;

    fn call(&self, args: A) -> Result<Arc<R>, E> {
        TryMemoCache::call(self, args)
    }

    fn invalidate(&self, args: &A) -> bool {
        TryMemoCache::invalidate(self, args)
    }

    fn len(&self) -> usize {
        TryMemoCache::len(self)
    }

    fn capacity(&self) -> usize {
        TryMemoCache::capacity(self)
    }

    fn clear(&self) {
        TryMemoCache::clear(self)
    }
}

impl<A, R, E, F> fmt::Debug for TryMemoCache<A, R, E, F>
where
    A: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryMemoCache")
            .field("len", &self.shared.len())
            .field("capacity", &self.shared.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    mod correctness {
        use super::*;

        #[test]
        fn success_is_cached() {
            let invocations = AtomicUsize::new(0);
            let cache = TryMemoCache::new(8, |_, n: &u64| {
                invocations.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(n * 2)
            });

            assert_eq!(*cache.call(5).unwrap(), 10);
            assert_eq!(*cache.call(5).unwrap(), 10);
            assert_eq!(invocations.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn failure_is_not_cached_and_retries() {
            let invocations = AtomicUsize::new(0);
            let cache = TryMemoCache::new(8, |_, n: &u64| {
                if invocations.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("first attempt fails".to_string())
                } else {
                    Ok(n + 1)
                }
            });

            assert_eq!(cache.call(1), Err("first attempt fails".to_string()));
            assert!(cache.is_empty());

            assert_eq!(*cache.call(1).unwrap(), 2);
            assert_eq!(invocations.load(Ordering::SeqCst), 2);

            // Now cached: no third invocation
            assert_eq!(*cache.call(1).unwrap(), 2);
            assert_eq!(invocations.load(Ordering::SeqCst), 2);
        }

        #[test]
        fn error_propagates_verbatim() {
            #[derive(Debug, Clone, PartialEq)]
            struct LookupFailed {
                code: u32,
            }

            let cache = TryMemoCache::new(8, |_, _: &u64| -> Result<u64, LookupFailed> {
                Err(LookupFailed { code: 404 })
            });

            assert_eq!(cache.call(1), Err(LookupFailed { code: 404 }));
        }

        #[test]
        fn failure_on_one_key_leaves_others_cached() {
            let cache = TryMemoCache::new(8, |_, n: &u64| {
                if *n == 13 {
                    Err("unlucky".to_string())
                } else {
                    Ok(*n)
                }
            });

            assert_eq!(*cache.call(1).unwrap(), 1);
            assert!(cache.call(13).is_err());
            assert_eq!(cache.len(), 1);
            assert_eq!(*cache.call(1).unwrap(), 1);
        }

        #[test]
        fn recursive_failure_propagates_up_the_call_tree() {
            let cache = TryMemoCache::new(16, |rec: &dyn TryRecurse<u32, u32, String>, n: &u32| {
                if *n > 4 {
                    return Err(format!("{n} exceeds limit"));
                }
                if *n <= 1 {
                    Ok(1)
                } else {
                    Ok(n * *rec.call(n - 1)?)
                }
            });

            assert_eq!(*cache.call(4).unwrap(), 24);
            assert_eq!(cache.call(6), Err("6 exceeds limit".to_string()));
            // Sub-results below the limit stayed cached
            assert_eq!(*cache.call(3).unwrap(), 6);
        }

        #[test]
        fn eviction_applies_to_successful_entries() {
            let invocations = AtomicUsize::new(0);
            let cache = TryMemoCache::new(2, |_, n: &u64| {
                invocations.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(*n)
            });

            cache.call(1).unwrap();
            cache.call(2).unwrap();
            cache.call(3).unwrap(); // evicts key 1
            cache.call(1).unwrap(); // recomputed
            assert_eq!(invocations.load(Ordering::SeqCst), 4);
        }

        #[test]
        fn try_new_rejects_zero_capacity() {
            let err =
                TryMemoCache::try_new(0, |_, n: &u64| Ok::<_, String>(*n)).unwrap_err();
            assert!(err.to_string().contains("capacity"));
        }
    }
}
