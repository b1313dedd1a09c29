//! # Memoizing Cache (infallible functions)
//!
//! [`MemoCache`] wraps a pure function `f` so that calling the cache is
//! referentially equivalent to calling `f` directly, while repeated calls
//! with structurally equal arguments are served from a bounded LRU store and
//! concurrent callers for the same cold key converge on a single in-flight
//! computation.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         MemoCache<A, R, F>                           │
//!   │                                                                      │
//!   │   func: F  (runs OUTSIDE the lock)                                   │
//!   │                                                                      │
//!   │   ┌────────────────────────────────────────────────────────────────┐ │
//!   │   │              Mutex<MemoState>  (short critical sections)       │ │
//!   │   │                                                                │ │
//!   │   │   FxHashMap<A, Slot>          RecencyList<A> (ready keys)      │ │
//!   │   │   ┌─────────┬──────────┐      head ─► [k3] ◄─► [k1] ◄─ tail    │ │
//!   │   │   │   key   │  Slot    │            (MRU)         (LRU)        │ │
//!   │   │   ├─────────┼──────────┤                                       │ │
//!   │   │   │   k1    │ Ready(v) │                                       │ │
//!   │   │   │   k2    │ Pending ─┼──► Inflight { Mutex, Condvar }        │ │
//!   │   │   │   k3    │ Ready(v) │      ▲    waiters block here          │ │
//!   │   │   └─────────┴──────────┘      └── computing thread resolves    │ │
//!   │   └────────────────────────────────────────────────────────────────┘ │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Call Flow
//!
//! ```text
//!   call(args)
//!   ═══════════════════════════════════════════════════════════════════════
//!
//!   lock state ── Ready?  ──► touch recency, return Arc          (hit)
//!             ├── Pending? ──► unlock, block on Inflight condvar (wait)
//!             └── absent   ──► insert Pending, unlock            (claim)
//!                                   │
//!                                   ▼
//!                            value = f(handle, &args)     ← NO LOCK HELD
//!                                   │
//!                  ┌────────────────┼─────────────────┐
//!                  ▼                ▼                 ▼
//!               returns          panics          (fallible: Err)
//!             relock, maybe    guard abandons:    see TryMemoCache
//!             evict LRU,       remove Pending,
//!             store Ready,     poison waiters
//!             notify waiters
//! ```
//!
//! ## Operations
//!
//! | Method             | Lock held       | Description                          |
//! |--------------------|-----------------|--------------------------------------|
//! | `new` / `try_new`  | none            | Construct; zero capacity rejected    |
//! | `call(args)`       | lookup + store  | Memoized invocation of `f`           |
//! | `invalidate(&a)`   | yes             | Drop entry in any state              |
//! | `len` / `is_empty` | yes             | Entry count (pending included)       |
//! | `ready_len`        | yes             | Ready (evictable) entries only       |
//! | `capacity`         | none            | Configured bound on ready entries    |
//! | `clear`            | yes             | Drop all entries                     |
//!
//! ## Guarantees
//!
//! - **Exactly-once per generation**: all callers that observe the same
//!   pending entry receive the same `Arc<R>`; `f` runs once for that key
//!   until the entry is evicted or invalidated.
//! - **Isolation between keys**: `f` executes with no cache lock held, so a
//!   slow computation for one key never delays hits or computations for
//!   other keys.
//! - **Bounded ready set**: at most `capacity` ready entries; completing a
//!   computation past the bound evicts the least-recently-used ready entry.
//!   Pending entries are never evicted and may transiently push the total
//!   entry count above `capacity`.
//!
//! ## Caller Contract
//!
//! `f` must be pure: no observable side effects, and structurally equal
//! arguments always produce the same result. The cache cannot detect
//! violations; an impure `f` yields whichever result happened to be cached
//! first. Results are shared as `Arc<R>` across all callers — mutating
//! shared state reachable through the result corrupts what later callers
//! observe as a cached value.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use memokit::memo::MemoCache;
//!
//! let invocations = AtomicUsize::new(0);
//! let cache = MemoCache::new(10, |_, n: &u64| {
//!     invocations.fetch_add(1, Ordering::SeqCst);
//!     (1..=*n).product::<u64>()
//! });
//!
//! assert_eq!(*cache.call(5), 120);
//! assert_eq!(*cache.call(5), 120); // hit: no second invocation
//! assert_eq!(invocations.load(Ordering::SeqCst), 1);
//!
//! assert_eq!(*cache.call(3), 6); // new key: computed
//! assert_eq!(invocations.load(Ordering::SeqCst), 2);
//! ```
//!
//! ## Thread Safety
//!
//! `MemoCache` is `Send + Sync` when `A`, `R`, and `F` are; share it behind
//! an `Arc` and call from any number of threads. Waiting callers block on a
//! per-key condvar (no polling, no spinning) and the cache imposes no
//! timeout: a caller that wants bounded waiting wraps `call` itself and, on
//! timeout, simply stops waiting — the in-flight computation keeps running
//! for the remaining waiters.

use std::convert::Infallible;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::memo::core::{CompletionGuard, Lookup, MemoShared};
#[cfg(feature = "metrics")]
use crate::metrics::MemoMetricsSnapshot;
use crate::traits::{Memoized, Recurse};

/// Bounded, concurrency-safe memoization of an infallible pure function.
///
/// The wrapped function receives a [`Recurse`] handle as its first parameter;
/// recursive self-calls routed through the handle re-enter the cache, so
/// every recursion level is memoized and de-duplicated. Non-recursive
/// functions ignore the handle.
///
/// # Example
///
/// ```
/// use memokit::memo::MemoCache;
/// use memokit::traits::Recurse;
///
/// let fact = MemoCache::new(10, |rec: &dyn Recurse<u64, u64>, n: &u64| {
///     if *n <= 1 { 1 } else { n * *rec.call(n - 1) }
/// });
///
/// assert_eq!(*fact.call(5), 120);
/// // Sub-results 1..=5 were stored along the way
/// assert_eq!(fact.len(), 5);
/// assert_eq!(*fact.call(3), 6); // hit on a shared sub-result
/// ```
pub struct MemoCache<A, R, F>
where
    A: Clone + Eq + Hash,
{
    shared: MemoShared<A, R, Infallible>,
    func: F,
}

impl<A, R, F> MemoCache<A, R, F>
where
    A: Clone + Eq + Hash,
    F: Fn(&dyn Recurse<A, R>, &A) -> R,
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
            Err(err) => panic!("MemoCache::new: {err}"),
        }
    }

    /// Fallible constructor: rejects a zero capacity with [`ConfigError`]
    /// at construction time rather than on first call.
    ///
    /// # Example
    ///
    /// ```
    /// use memokit::memo::MemoCache;
    ///
    /// assert!(MemoCache::try_new(8, |_, n: &u64| n + 1).is_ok());
    /// assert!(MemoCache::try_new(0, |_, n: &u64| n + 1).is_err());
    /// ```
    pub fn try_new(capacity: usize, func: F) -> Result<Self, ConfigError> {
        Ok(MemoCache {
            shared: MemoShared::try_new(capacity)?,
            func,
        })
    }

    /// Returns the memoized result for `args`.
    ///
    /// - **Hit**: returns the stored `Arc<R>` without invoking `f`, and
    ///   refreshes the entry's recency.
    /// - **In flight elsewhere**: blocks until that computation resolves and
    ///   returns the same `Arc<R>` — `f` is not invoked again.
    /// - **Miss**: invokes `f` outside any cache lock, stores the result
    ///   (evicting the least-recently-used ready entry if at capacity), and
    ///   wakes all waiters.
    ///
    /// If `f` panics, the pending entry is removed so a later call retries,
    /// and any threads already waiting on this key panic with an explicit
    /// message.
    ///
    /// # Example
    ///
    /// ```
    /// use memokit::memo::MemoCache;
    ///
    /// let cache = MemoCache::new(16, |_, s: &String| s.len());
    /// assert_eq!(*cache.call("hello".to_string()), 5);
    ///
    /// // Structurally equal argument, distinct allocation: still a hit
    /// assert_eq!(*cache.call("hello".to_string()), 5);
    /// assert_eq!(cache.len(), 1);
    /// ```
    pub fn call(&self, args: A) -> Arc<R> {
        match self.shared.lookup_or_claim(&args) {
            Lookup::Hit(value) => value,
            Lookup::Wait(inflight) => match inflight.wait() {
                Ok(value) => value,
                Err(never) => match never {},
            },
            Lookup::Claimed(inflight) => {
                let guard = CompletionGuard::new(&self.shared, &args, &inflight);
                let value = Arc::new((self.func)(self as &dyn Recurse<A, R>, &args));
                guard.disarm();
                self.shared.complete(&args, &inflight, Arc::clone(&value));
                value
            },
        }
    }

    /// Removes any entry for `args` regardless of state, forcing
    /// recomputation on the next call. Returns `false` if absent.
    ///
    /// Invalidating a pending entry ends its generation: the in-flight
    /// computation still resolves for its waiters, but is not stored.
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

impl<A, R, F> Recurse<A, R> for MemoCache<A, R, F>
where
    A: Clone + Eq + Hash,
    F: Fn(&dyn Recurse<A, R>, &A) -> R,
{
    fn call(&self, args: A) -> Arc<R> {
        MemoCache::call(self, args)
    }
}

impl<A, R, F> Memoized<A> for MemoCache<A, R, F>
where
    A: Clone + Eq + Hash,
    F: Fn(&dyn Recurse<A, R>, &A) -> R,
{
    type Output = Arc<R>;

    fn call(&self, args: A) -> Arc<R> {
        MemoCache::call(self, args)
    }

    fn invalidate(&self, args: &A) -> bool {
        MemoCache::invalidate(self, args)
    }

    fn len(&self) -> usize {
        MemoCache::len(self)
    }

    fn capacity(&self) -> usize {
        MemoCache::capacity(self)
    }

    fn clear(&self) {
        MemoCache::clear(self)
    }
}

impl<A, R, F> fmt::Debug for MemoCache<A, R, F>
where
    A: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("len", &self.shared.len())
            .field("capacity", &self.shared.capacity())
            .finish_non_exhaustive()
    }
}
