//! # Memoization Trait Surface
//!
//! This module defines the trait seams of the memoization subsystem: the
//! unified [`Memoized`] interface shared by the cache types, and the
//! recursion handles ([`Recurse`], [`TryRecurse`]) a wrapped function uses to
//! route recursive self-calls back through the cache.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌─────────────────────────────────────────┐
//!                    │             Memoized<A>                 │
//!                    │                                         │
//!                    │  call(&, A) → Self::Output              │
//!                    │  invalidate(&, &A) → bool               │
//!                    │  len(&) → usize                         │
//!                    │  is_empty(&) → bool                     │
//!                    │  capacity(&) → usize                    │
//!                    │  clear(&)                               │
//!                    └──────────────────┬──────────────────────┘
//!                                       │
//!                    ┌──────────────────┴──────────────────────┐
//!                    │                                         │
//!                    ▼                                         ▼
//!     ┌───────────────────────────────┐       ┌───────────────────────────────┐
//!     │   MemoCache<A, R, F>          │       │   TryMemoCache<A, R, E, F>    │
//!     │                               │       │                               │
//!     │   Output = Arc<R>             │       │   Output = Result<Arc<R>, E>  │
//!     │   also impls Recurse<A, R>    │       │   also impls                  │
//!     │                               │       │   TryRecurse<A, R, E>         │
//!     └───────────────────────────────┘       └───────────────────────────────┘
//! ```
//!
//! ## Why a Recursion Handle
//!
//! The wrapped function receives `&dyn Recurse<A, R>` as its first parameter.
//! A recursive step that goes through the handle re-enters the cache, so each
//! sub-result is stored and de-duplicated exactly like a top-level call. A
//! function that recurses on a *raw inner* function instead would only
//! memoize its outermost result, and independent call trees would recompute
//! every shared sub-result.
//!
//! ```text
//!   fact(5) through the handle        fact(5) on a raw inner fn
//!   ══════════════════════════        ═════════════════════════
//!   5 → 4 → 3 → 2 → 1  (5 stores)     5  (1 store)
//!   later fact(3): cache hit          later fact(3): recomputes 3, 2, 1
//! ```
//!
//! Non-recursive functions simply ignore the handle.
//!
//! ## Trait Summary
//!
//! | Trait              | Object safe | Purpose                              |
//! |--------------------|-------------|--------------------------------------|
//! | `Memoized<A>`      | no (assoc.) | Unified cache operations             |
//! | `Recurse<A, R>`    | yes         | Re-entry point for infallible `f`    |
//! | `TryRecurse<A,R,E>`| yes         | Re-entry point for fallible `f`      |

use std::sync::Arc;

/// Re-entry handle passed to an infallible wrapped function.
///
/// Calling through the handle is referentially equivalent to calling
/// [`MemoCache::call`](crate::memo::MemoCache::call) on the owning cache, so
/// every recursion level participates in caching and in-flight
/// de-duplication.
///
/// # Example
///
/// ```
/// use memokit::memo::MemoCache;
/// use memokit::traits::Recurse;
///
/// let fib = MemoCache::new(64, |rec: &dyn Recurse<u64, u64>, n: &u64| {
///     if *n < 2 {
///         *n
///     } else {
///         *rec.call(n - 1) + *rec.call(n - 2)
///     }
/// });
/// assert_eq!(*fib.call(10), 55);
/// ```
///
/// # Deadlock
///
/// Recursing on the *same* key (`rec.call` with arguments equal to the ones
/// currently being computed) is a non-terminating computation: the recursive
/// call finds its own pending entry and waits on it forever. This is the
/// caller contract violation described in the crate docs, not a cache bug.
pub trait Recurse<A, R> {
    /// Calls the memoized function for `args`, sharing cached sub-results.
    fn call(&self, args: A) -> Arc<R>;
}

/// Re-entry handle passed to a fallible wrapped function.
///
/// The fallible counterpart of [`Recurse`]: a recursive step that fails
/// propagates its error up the recursion without caching anything.
///
/// # Example
///
/// ```
/// use memokit::memo::TryMemoCache;
/// use memokit::traits::TryRecurse;
///
/// let cache = TryMemoCache::new(16, |rec: &dyn TryRecurse<u32, u32, String>, n: &u32| {
///     if *n > 10 {
///         return Err(format!("{n} out of range"));
///     }
///     if *n <= 1 {
///         Ok(1)
///     } else {
///         Ok(n * *rec.call(n - 1)?)
///     }
/// });
/// assert_eq!(*cache.call(4).unwrap(), 24);
/// assert!(cache.call(11).is_err());
/// ```
pub trait TryRecurse<A, R, E> {
    /// Calls the memoized function for `args`, sharing cached sub-results.
    fn call(&self, args: A) -> Result<Arc<R>, E>;
}

/// Unified operations shared by every memoizing cache.
///
/// `Output` differs between the cache types: `Arc<R>` for
/// [`MemoCache`](crate::memo::MemoCache) and `Result<Arc<R>, E>` for
/// [`TryMemoCache`](crate::memo::TryMemoCache).
///
/// # Example
///
/// ```
/// use memokit::memo::MemoCache;
/// use memokit::traits::Memoized;
///
/// fn warm<A: Clone, M: Memoized<A>>(cache: &M, keys: &[A]) {
///     for key in keys {
///         let _ = cache.call(key.clone());
///     }
/// }
///
/// let cache = MemoCache::new(16, |_, n: &u64| n * n);
/// warm(&cache, &[1, 2, 3]);
/// assert_eq!(cache.len(), 3);
/// ```
pub trait Memoized<A> {
    /// What a call produces: the cached value, possibly wrapped in a `Result`.
    type Output;

    /// Returns the memoized result for `args`, computing it at most once per
    /// generation.
    fn call(&self, args: A) -> Self::Output;

    /// Removes any entry for `args` regardless of state, forcing
    /// recomputation on the next call. Returns `false` if absent.
    fn invalidate(&self, args: &A) -> bool;

    /// Returns the current entry count, pending entries included.
    fn len(&self) -> usize;

    /// Returns `true` if the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the configured capacity (maximum number of ready entries).
    fn capacity(&self) -> usize;

    /// Removes all entries. In-flight computations still resolve for their
    /// waiters but are no longer stored.
    fn clear(&self);
}
