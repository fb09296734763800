//! Build cache keys and caching decisions
//!
//! The calculator turns a task's state before execution into a
//! [`BuildCacheKey`](stamp_core::BuildCacheKey) and decides whether the
//! outputs may be cached at all. The decision is a closed [`CachingState`]:
//! either enabled with a key, or disabled with the reasons why.

pub mod calculator;
pub mod reason;
pub mod state;

pub use calculator::{hash_input_value, BuildCacheKeyCalculator, CachingPreconditions};
pub use reason::{Cacheability, CachingDisabledReason, CachingDisabledReasonCategory};
pub use state::{BeforeExecutionState, CachingState, DisabledCachingState, EnabledCachingState};
