//! Internal data structures backing the memoization cache.

pub mod recency_list;

pub use recency_list::RecencyList;
