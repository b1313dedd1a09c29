//! Error types for the memokit library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (the only such parameter today is a zero capacity).
//!
//! Computation failures are deliberately *not* represented here: a fallible
//! wrapped function surfaces its own error type `E` through
//! [`TryMemoCache::call`](crate::memo::TryMemoCache::call) verbatim, and the
//! cache never wraps, caches, or retries it.
//!
//! ## Example Usage
//!
//! ```
//! use memokit::error::ConfigError;
//! use memokit::memo::MemoCache;
//!
//! // Fallible constructor for user-configurable parameters
//! let cache: Result<MemoCache<u64, u64, _>, ConfigError> =
//!     MemoCache::try_new(100, |_, n: &u64| n + 1);
//! assert!(cache.is_ok());
//!
//! // Zero capacity is caught at construction, without panicking
//! let bad = MemoCache::try_new(0, |_, n: &u64| n + 1);
//! assert!(bad.is_err());
//! ```

use std::fmt;

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by fallible constructors such as
/// [`MemoCache::try_new`](crate::memo::MemoCache::try_new) and
/// [`MemoBuilder::try_build`](crate::builder::MemoBuilder::try_build).
/// Carries a human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use memokit::memo::MemoCache;
///
/// let err = MemoCache::try_new(0, |_, n: &u64| n * 2).unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}
