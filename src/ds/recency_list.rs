//! # Access-Order Recency Index
//!
//! [`RecencyList`] tracks *which key was used when*, nothing else. The
//! memoization cache stores values in its own slot map and consults this
//! structure only to answer one question in O(1): "which ready key is the
//! least recently used right now?"
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────────────────────────────────────────┐
//!   │                      RecencyList<K>                             │
//!   │                                                                 │
//!   │   ┌───────────────────────────────────────────────────────┐     │
//!   │   │  FxHashMap<K, NonNull<Node<K>>>  (key → node)         │     │
//!   │   └───────────────────────────────┬───────────────────────┘     │
//!   │                                   │                             │
//!   │   ┌───────────────────────────────▼───────────────────────┐     │
//!   │   │  doubly linked node list (recency order)              │     │
//!   │   │                                                       │     │
//!   │   │  head ──► ┌──────┐ ◄──► ┌──────┐ ◄──► ┌──────┐ ◄── tail     │
//!   │   │    (MRU)  │ key  │      │ key  │      │ key  │   (LRU)      │
//!   │   │           └──────┘      └──────┘      └──────┘       │     │
//!   │   └───────────────────────────────────────────────────────┘     │
//!   └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Method          | Complexity | Description                              |
//! |-----------------|------------|------------------------------------------|
//! | `push_mru(k)`   | O(1)       | Track a new key at the MRU position      |
//! | `touch(&k)`     | O(1)       | Move an existing key to MRU              |
//! | `remove(&k)`    | O(1)       | Stop tracking a key                      |
//! | `pop_lru()`     | O(1)       | Remove and return the LRU key            |
//! | `peek_lru()`    | O(1)       | Borrow the LRU key without removing      |
//! | `len()`         | O(1)       | Number of tracked keys                   |
//! | `clear()`       | O(n)       | Drop all nodes                           |
//!
//! ## Safety
//!
//! Nodes are heap-allocated and reached through `NonNull` handles; the index
//! map is the sole owner of every node, and the prev/next links never escape
//! this module. `unlink`/`link_front` preserve the list invariant that is
//! re-checked by `validate_invariants` in debug builds.
//!
//! `RecencyList` itself is single-threaded; the memoization cache provides
//! exclusion by keeping it behind its state mutex.

use std::fmt;
use std::hash::Hash;
use std::ptr::NonNull;

use rustc_hash::FxHashMap;

struct Node<K> {
    prev: Option<NonNull<Node<K>>>,
    next: Option<NonNull<Node<K>>>,
    key: K,
}

/// Bounded-cache recency index: keys ordered from most to least recently used.
///
/// # Example
///
/// ```
/// use memokit::ds::RecencyList;
///
/// let mut recency: RecencyList<u32> = RecencyList::new();
/// recency.push_mru(1);
/// recency.push_mru(2);
/// recency.push_mru(3);
///
/// // Key 1 is the oldest
/// assert_eq!(recency.peek_lru(), Some(&1));
///
/// // Touching it moves it to the front; key 2 becomes LRU
/// assert!(recency.touch(&1));
/// assert_eq!(recency.pop_lru(), Some(2));
/// assert_eq!(recency.len(), 2);
/// ```
pub struct RecencyList<K>
where
    K: Clone + Eq + Hash,
{
    index: FxHashMap<K, NonNull<Node<K>>>,
    head: Option<NonNull<Node<K>>>,
    tail: Option<NonNull<Node<K>>>,
}

// SAFETY: the NonNull handles only reference heap nodes owned exclusively by
// this structure; sending the structure moves that ownership wholesale.
unsafe impl<K> Send for RecencyList<K> where K: Clone + Eq + Hash + Send {}

// SAFETY: all mutation requires &mut self; shared references permit no access
// to the raw links. Exclusion across threads is the caller's lock.
unsafe impl<K> Sync for RecencyList<K> where K: Clone + Eq + Hash + Sync {}

impl<K> RecencyList<K>
where
    K: Clone + Eq + Hash,
{
    /// Creates an empty recency list.
    #[inline]
    pub fn new() -> Self {
        RecencyList {
            index: FxHashMap::default(),
            head: None,
            tail: None,
        }
    }

    /// Creates an empty recency list with pre-allocated index space.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        RecencyList {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            head: None,
            tail: None,
        }
    }

    /// Unlink a node from the chain. The index entry is untouched; the node
    /// keeps its stale links until relinked or freed.
    #[inline(always)]
    fn unlink(&mut self, node_ptr: NonNull<Node<K>>) {
        let (prev, next) = unsafe {
            let node = node_ptr.as_ref();
            (node.prev, node.next)
        };

        unsafe {
            if let Some(mut p) = prev {
                p.as_mut().next = next;
            } else {
                self.head = next;
            }
            if let Some(mut n) = next {
                n.as_mut().prev = prev;
            } else {
                self.tail = prev;
            }
        }
    }

    /// Link an unlinked node in at the MRU position.
    #[inline(always)]
    fn link_front(&mut self, mut node_ptr: NonNull<Node<K>>) {
        let displaced = self.head.replace(node_ptr);
        unsafe {
            let node = node_ptr.as_mut();
            node.prev = None;
            node.next = displaced;
        }
        match displaced {
            Some(mut h) => unsafe { h.as_mut().prev = Some(node_ptr) },
            None => self.tail = Some(node_ptr),
        }
    }

    /// Starts tracking `key` at the MRU position.
    ///
    /// The key must not already be tracked; tracking it twice would corrupt
    /// the index. Debug builds assert this.
    pub fn push_mru(&mut self, key: K) {
        debug_assert!(
            !self.index.contains_key(&key),
            "push_mru on already tracked key"
        );

        let node = Box::new(Node {
            prev: None,
            next: None,
            key: key.clone(),
        });
        let node_ptr = NonNull::from(Box::leak(node));

        self.index.insert(key, node_ptr);
        self.link_front(node_ptr);

        #[cfg(debug_assertions)]
        self.validate_invariants();
    }

    /// Moves `key` to the MRU position. Returns `false` if it is not tracked.
    pub fn touch(&mut self, key: &K) -> bool {
        if let Some(&node_ptr) = self.index.get(key) {
            self.unlink(node_ptr);
            self.link_front(node_ptr);

            #[cfg(debug_assertions)]
            self.validate_invariants();

            true
        } else {
            false
        }
    }

    /// Stops tracking `key`. Returns `false` if it is not tracked.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(node_ptr) => {
                self.unlink(node_ptr);
                drop(unsafe { Box::from_raw(node_ptr.as_ptr()) });

                #[cfg(debug_assertions)]
                self.validate_invariants();

                true
            },
            None => false,
        }
    }

    /// Removes and returns the least recently used key.
    pub fn pop_lru(&mut self) -> Option<K> {
        let tail_ptr = self.tail?;
        let node = unsafe { Box::from_raw(tail_ptr.as_ptr()) };

        self.tail = node.prev;
        match self.tail {
            Some(mut t) => unsafe { t.as_mut().next = None },
            None => self.head = None,
        }

        self.index.remove(&node.key);

        #[cfg(debug_assertions)]
        self.validate_invariants();

        Some(node.key)
    }

    /// Borrows the least recently used key without removing it.
    #[inline]
    pub fn peek_lru(&self) -> Option<&K> {
        self.tail.map(|tail_ptr| unsafe { &(*tail_ptr.as_ptr()).key })
    }

    /// Returns `true` if `key` is tracked.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the number of tracked keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no key is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Drops every tracked key.
    pub fn clear(&mut self) {
        while self.pop_lru().is_some() {}
        debug_assert!(self.index.is_empty());
    }

    /// Validate internal invariants (debug builds only): the chain visits
    /// exactly the indexed keys, every back-link matches the walk, and
    /// `tail` is the last node reached.
    #[cfg(debug_assertions)]
    fn validate_invariants(&self) {
        let mut visited = 0usize;
        let mut previous: Option<NonNull<Node<K>>> = None;
        let mut current = self.head;

        while let Some(ptr) = current {
            visited += 1;
            assert!(
                visited <= self.index.len(),
                "cycle detected in recency list"
            );
            let node = unsafe { ptr.as_ref() };
            debug_assert_eq!(node.prev, previous, "back-link out of step with walk");
            debug_assert!(self.index.contains_key(&node.key));
            previous = current;
            current = node.next;
        }

        debug_assert_eq!(visited, self.index.len());
        debug_assert_eq!(self.tail, previous);
        debug_assert_eq!(self.head.is_none(), self.index.is_empty());
    }
}

impl<K> Drop for RecencyList<K>
where
    K: Clone + Eq + Hash,
{
    fn drop(&mut self) {
        while self.pop_lru().is_some() {}
    }
}

impl<K> Default for RecencyList<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for RecencyList<K>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecencyList")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod correctness {
        use super::*;

        mod basic_behavior {
            use super::*;

            #[test]
            fn new_list_is_empty() {
                let recency: RecencyList<u32> = RecencyList::new();
                assert_eq!(recency.len(), 0);
                assert!(recency.is_empty());
                assert!(recency.peek_lru().is_none());
            }

            #[test]
            fn push_tracks_keys_in_order() {
                let mut recency = RecencyList::new();
                recency.push_mru(1);
                recency.push_mru(2);
                recency.push_mru(3);

                assert_eq!(recency.len(), 3);
                assert!(recency.contains(&1));
                assert!(recency.contains(&2));
                assert!(recency.contains(&3));
                assert_eq!(recency.peek_lru(), Some(&1));
            }

            #[test]
            fn pop_lru_returns_oldest_first() {
                let mut recency = RecencyList::new();
                recency.push_mru(1);
                recency.push_mru(2);
                recency.push_mru(3);

                assert_eq!(recency.pop_lru(), Some(1));
                assert_eq!(recency.pop_lru(), Some(2));
                assert_eq!(recency.pop_lru(), Some(3));
                assert_eq!(recency.pop_lru(), None);
                assert!(recency.is_empty());
            }

            #[test]
            fn touch_moves_key_to_front() {
                let mut recency = RecencyList::new();
                recency.push_mru(1);
                recency.push_mru(2);
                recency.push_mru(3);

                assert!(recency.touch(&1));
                assert_eq!(recency.pop_lru(), Some(2));
                assert_eq!(recency.pop_lru(), Some(3));
                assert_eq!(recency.pop_lru(), Some(1));
            }

            #[test]
            fn touching_the_current_mru_keeps_order() {
                let mut recency = RecencyList::new();
                recency.push_mru(1);
                recency.push_mru(2);
                recency.push_mru(3);

                // Unlinks the head and relinks it in place.
                assert!(recency.touch(&3));
                assert_eq!(recency.pop_lru(), Some(1));
                assert_eq!(recency.pop_lru(), Some(2));
                assert_eq!(recency.pop_lru(), Some(3));
            }

            #[test]
            fn touch_missing_key_returns_false() {
                let mut recency: RecencyList<u32> = RecencyList::new();
                recency.push_mru(1);
                assert!(!recency.touch(&99));
            }

            #[test]
            fn remove_unlinks_key() {
                let mut recency = RecencyList::new();
                recency.push_mru(1);
                recency.push_mru(2);
                recency.push_mru(3);

                assert!(recency.remove(&2));
                assert!(!recency.remove(&2));
                assert_eq!(recency.len(), 2);
                assert_eq!(recency.pop_lru(), Some(1));
                assert_eq!(recency.pop_lru(), Some(3));
            }

            #[test]
            fn remove_head_and_tail() {
                let mut recency = RecencyList::new();
                recency.push_mru(1);
                recency.push_mru(2);
                recency.push_mru(3);

                assert!(recency.remove(&3)); // head
                assert!(recency.remove(&1)); // tail
                assert_eq!(recency.peek_lru(), Some(&2));
                assert_eq!(recency.pop_lru(), Some(2));
            }

            #[test]
            fn clear_drops_everything() {
                let mut recency = RecencyList::new();
                for i in 0..16 {
                    recency.push_mru(i);
                }
                recency.clear();
                assert!(recency.is_empty());
                assert!(recency.pop_lru().is_none());
            }

            #[test]
            fn single_key_list() {
                let mut recency = RecencyList::new();
                recency.push_mru(7);
                assert!(recency.touch(&7));
                assert_eq!(recency.peek_lru(), Some(&7));
                assert_eq!(recency.pop_lru(), Some(7));
                assert!(recency.is_empty());
            }

            #[test]
            fn composite_keys_by_value() {
                let mut recency: RecencyList<(String, u32)> = RecencyList::new();
                recency.push_mru(("a".to_string(), 1));
                recency.push_mru(("b".to_string(), 2));

                // Structurally equal key, distinct allocation
                assert!(recency.touch(&("a".to_string(), 1)));
                assert_eq!(recency.pop_lru(), Some(("b".to_string(), 2)));
            }
        }

        mod memory_safety {
            use super::*;

            #[test]
            fn drop_releases_all_nodes() {
                // Would leak or double-free under Miri if links were wrong.
                let mut recency = RecencyList::new();
                for i in 0..1000u64 {
                    recency.push_mru(i);
                }
                for i in (0..1000u64).step_by(3) {
                    recency.remove(&i);
                }
                drop(recency);
            }

            #[test]
            fn interleaved_ops_keep_invariants() {
                let mut recency = RecencyList::new();
                for round in 0..50u64 {
                    for i in 0..20u64 {
                        if !recency.contains(&i) {
                            recency.push_mru(i);
                        } else {
                            recency.touch(&i);
                        }
                    }
                    if round % 2 == 0 {
                        recency.pop_lru();
                    } else {
                        recency.remove(&(round % 20));
                    }
                }
                assert!(recency.len() <= 20);
            }
        }
    }
}
