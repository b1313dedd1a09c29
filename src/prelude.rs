pub use crate::builder::MemoBuilder;
pub use crate::ds::RecencyList;
pub use crate::error::ConfigError;
pub use crate::memo::{MemoCache, TryMemoCache};
#[cfg(feature = "metrics")]
pub use crate::metrics::MemoMetricsSnapshot;
pub use crate::traits::{Memoized, Recurse, TryRecurse};
