//! Shared memoization state machine.
//!
//! Both public cache types ([`MemoCache`](crate::memo::MemoCache) and
//! [`TryMemoCache`](crate::memo::TryMemoCache)) drive the same core:
//! a slot map of per-key entries, a [`RecencyList`] over the ready keys, and
//! per-key [`Inflight`] handles that waiters block on. The wrapped function
//! itself never runs inside this module; callers claim a pending slot, run
//! the function with the state lock released, and report the outcome back
//! through [`MemoShared::complete`] or [`MemoShared::fail`].
//!
//! ## Entry state machine
//!
//! ```text
//!              lookup_or_claim (miss)
//!    absent ───────────────────────────► Pending(inflight)
//!      ▲                                   │         │
//!      │ fail / abandon / invalidate       │         │ complete
//!      └───────────────────────────────────┘         ▼
//!      ▲                                           Ready(value)
//!      │ evict (LRU) / invalidate                    │
//!      └─────────────────────────────────────────────┘
//! ```
//!
//! A `Pending` slot records exactly which computation owns it via the
//! `Arc<Inflight>` identity; `complete`/`fail`/`abandon` only act on the slot
//! when that identity still matches (`Arc::ptr_eq`), so an `invalidate` or
//! `clear` racing with a completion ends that *generation* cleanly: the
//! waiters still receive the resolved result, but nothing is stored.

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;

use crate::ds::RecencyList;
use crate::error::ConfigError;
#[cfg(feature = "metrics")]
use crate::metrics::{MemoMetrics, MemoMetricsSnapshot};

/// One cache slot: a resolved result or a claim on an in-flight computation.
pub(crate) enum Slot<R, E> {
    Pending(Arc<Inflight<R, E>>),
    Ready(Arc<R>),
}

enum InflightState<R, E> {
    Running,
    Done(Result<Arc<R>, E>),
    /// The computing thread panicked before reporting an outcome.
    Abandoned,
}

/// Handle shared by every caller waiting on one in-flight computation.
pub(crate) struct Inflight<R, E> {
    state: Mutex<InflightState<R, E>>,
    resolved: Condvar,
}

impl<R, E> Inflight<R, E> {
    fn new() -> Self {
        Inflight {
            state: Mutex::new(InflightState::Running),
            resolved: Condvar::new(),
        }
    }

    fn resolve(&self, outcome: Result<Arc<R>, E>) {
        let mut state = self.state.lock();
        *state = InflightState::Done(outcome);
        drop(state);
        self.resolved.notify_all();
    }

    fn mark_abandoned(&self) {
        let mut state = self.state.lock();
        *state = InflightState::Abandoned;
        drop(state);
        self.resolved.notify_all();
    }

    /// Blocks until the computation resolves, then returns its outcome.
    ///
    /// No polling: waiters sleep on the condvar and re-check on wakeup.
    /// Panics if the computing thread panicked (the `std::sync::Once`
    /// poisoning precedent; the original payload cannot be re-thrown to
    /// multiple threads).
    pub(crate) fn wait(&self) -> Result<Arc<R>, E>
    where
        E: Clone,
    {
        let mut state = self.state.lock();
        loop {
            match &*state {
                InflightState::Done(outcome) => return outcome.clone(),
                InflightState::Abandoned => {
                    panic!("memoized computation panicked in another thread")
                },
                InflightState::Running => {},
            }
            self.resolved.wait(&mut state);
        }
    }
}

/// Outcome of a lookup: what the caller must do next.
pub(crate) enum Lookup<R, E> {
    /// Ready entry found; the shared result, recency already refreshed.
    Hit(Arc<R>),
    /// Another caller owns the computation; wait on this handle.
    Wait(Arc<Inflight<R, E>>),
    /// This caller claimed the key and must run the function, then report
    /// through `complete`/`fail` (or let the guard abandon on panic).
    Claimed(Arc<Inflight<R, E>>),
}

struct MemoState<A, R, E>
where
    A: Clone + Eq + Hash,
{
    slots: FxHashMap<A, Slot<R, E>>,
    /// Recency order over *ready* keys only. Pending keys are never evicted.
    recency: RecencyList<A>,
    #[cfg(feature = "metrics")]
    metrics: MemoMetrics,
}

/// Lock-guarded bookkeeping shared by the cache types.
///
/// Every mutation of the slot map and recency index happens inside one short
/// critical section here; the wrapped function runs strictly outside it, so
/// a slow computation for one key never blocks lookups for others.
pub(crate) struct MemoShared<A, R, E>
where
    A: Clone + Eq + Hash,
{
    state: Mutex<MemoState<A, R, E>>,
    capacity: usize,
}

impl<A, R, E> MemoShared<A, R, E>
where
    A: Clone + Eq + Hash,
{
    pub(crate) fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::new("capacity must be greater than zero"));
        }
        Ok(MemoShared {
            state: Mutex::new(MemoState {
                slots: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
                recency: RecencyList::with_capacity(capacity),
                #[cfg(feature = "metrics")]
                metrics: MemoMetrics::default(),
            }),
            capacity,
        })
    }

    /// Resolves `args` to a hit, a wait, or a fresh claim.
    ///
    /// On a miss this inserts the `Pending` slot before returning, so at most
    /// one `Claimed` exists per key until that generation resolves.
    pub(crate) fn lookup_or_claim(&self, args: &A) -> Lookup<R, E> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(slot) = state.slots.get(args) {
            return match slot {
                Slot::Ready(value) => {
                    let value = Arc::clone(value);
                    state.recency.touch(args);
                    #[cfg(feature = "metrics")]
                    {
                        state.metrics.call_hits += 1;
                    }
                    Lookup::Hit(value)
                },
                Slot::Pending(inflight) => {
                    #[cfg(feature = "metrics")]
                    {
                        state.metrics.pending_waits += 1;
                    }
                    Lookup::Wait(Arc::clone(inflight))
                },
            };
        }

        #[cfg(feature = "metrics")]
        {
            state.metrics.call_misses += 1;
        }

        let inflight = Arc::new(Inflight::new());
        state
            .slots
            .insert(args.clone(), Slot::Pending(Arc::clone(&inflight)));
        Lookup::Claimed(inflight)
    }

    /// True while `inflight` still owns the slot for `args`.
    fn owns_slot(state: &MemoState<A, R, E>, args: &A, inflight: &Arc<Inflight<R, E>>) -> bool {
        matches!(
            state.slots.get(args),
            Some(Slot::Pending(current)) if Arc::ptr_eq(current, inflight)
        )
    }

    /// Stores a successful result and wakes every waiter.
    ///
    /// Storing may evict the least-recently-used ready entry when the ready
    /// set is at capacity. If the generation was invalidated mid-flight the
    /// result is delivered to waiters but not stored.
    pub(crate) fn complete(&self, args: &A, inflight: &Arc<Inflight<R, E>>, value: Arc<R>) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if Self::owns_slot(state, args, inflight) {
            if state.recency.len() >= self.capacity {
                if let Some(victim) = state.recency.pop_lru() {
                    state.slots.remove(&victim);
                    #[cfg(feature = "metrics")]
                    {
                        state.metrics.evicted_entries += 1;
                    }
                }
            }
            state
                .slots
                .insert(args.clone(), Slot::Ready(Arc::clone(&value)));
            state.recency.push_mru(args.clone());
        }
        drop(guard);

        inflight.resolve(Ok(value));
    }

    /// Removes the pending slot and delivers the error to every waiter.
    ///
    /// Nothing is cached; the next call for `args` retries the function.
    pub(crate) fn fail(&self, args: &A, inflight: &Arc<Inflight<R, E>>, err: E) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if Self::owns_slot(state, args, inflight) {
            state.slots.remove(args);
        }
        #[cfg(feature = "metrics")]
        {
            state.metrics.failures += 1;
        }
        drop(guard);

        inflight.resolve(Err(err));
    }

    /// Panic path: removes the pending slot and poisons the waiters.
    pub(crate) fn abandon(&self, args: &A, inflight: &Arc<Inflight<R, E>>) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if Self::owns_slot(state, args, inflight) {
            state.slots.remove(args);
        }
        #[cfg(feature = "metrics")]
        {
            state.metrics.abandons += 1;
        }
        drop(guard);

        inflight.mark_abandoned();
    }

    /// Removes any entry for `args` regardless of state.
    pub(crate) fn invalidate(&self, args: &A) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let removed = state.slots.remove(args).is_some();
        state.recency.remove(args);
        #[cfg(feature = "metrics")]
        if removed {
            state.metrics.invalidations += 1;
        }
        removed
    }

    /// Removes every entry. In-flight generations resolve for their waiters
    /// but are no longer stored.
    pub(crate) fn clear(&self) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.slots.clear();
        state.recency.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    /// Number of ready (evictable) entries.
    pub(crate) fn ready_len(&self) -> usize {
        self.state.lock().recency.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn metrics_snapshot(&self) -> MemoMetricsSnapshot {
        let state = self.state.lock();
        MemoMetricsSnapshot {
            call_hits: state.metrics.call_hits,
            call_misses: state.metrics.call_misses,
            pending_waits: state.metrics.pending_waits,
            failures: state.metrics.failures,
            abandons: state.metrics.abandons,
            evicted_entries: state.metrics.evicted_entries,
            invalidations: state.metrics.invalidations,
            entry_count: state.slots.len(),
            ready_count: state.recency.len(),
            capacity: self.capacity,
        }
    }
}

/// Drop guard armed while the wrapped function runs.
///
/// If the function returns normally the caller disarms the guard and reports
/// through `complete`/`fail`. If it panics, the guard's drop runs during
/// unwinding and abandons the generation, so the pending slot never leaks and
/// waiters are not stranded.
pub(crate) struct CompletionGuard<'c, A, R, E>
where
    A: Clone + Eq + Hash,
{
    shared: &'c MemoShared<A, R, E>,
    args: &'c A,
    inflight: &'c Arc<Inflight<R, E>>,
    armed: bool,
}

impl<'c, A, R, E> CompletionGuard<'c, A, R, E>
where
    A: Clone + Eq + Hash,
{
    pub(crate) fn new(
        shared: &'c MemoShared<A, R, E>,
        args: &'c A,
        inflight: &'c Arc<Inflight<R, E>>,
    ) -> Self {
        CompletionGuard {
            shared,
            args,
            inflight,
            armed: true,
        }
    }

    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl<A, R, E> Drop for CompletionGuard<'_, A, R, E>
where
    A: Clone + Eq + Hash,
{
    fn drop(&mut self) {
        if self.armed {
            self.shared.abandon(self.args, self.inflight);
        }
    }
}
