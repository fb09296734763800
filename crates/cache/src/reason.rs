use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CachingDisabledReasonCategory {
    /// The task declared itself not cacheable
    NotCacheable,
    /// Caching is switched off for the whole build
    BuildCacheDisabled,
    /// Inputs or outputs could not be fingerprinted
    ValidationFailure,
    /// Cacheability could not be determined
    Unknown,
    /// Output locations contain content written by someone else
    OverlappingOutputs,
    /// The task has no outputs to cache
    NoOutputsDeclared,
}

impl fmt::Display for CachingDisabledReasonCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CachingDisabledReasonCategory::NotCacheable => "NOT_CACHEABLE",
            CachingDisabledReasonCategory::BuildCacheDisabled => "BUILD_CACHE_DISABLED",
            CachingDisabledReasonCategory::ValidationFailure => "VALIDATION_FAILURE",
            CachingDisabledReasonCategory::Unknown => "UNKNOWN",
            CachingDisabledReasonCategory::OverlappingOutputs => "OVERLAPPING_OUTPUTS",
            CachingDisabledReasonCategory::NoOutputsDeclared => "NO_OUTPUTS_DECLARED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CachingDisabledReason {
    pub category: CachingDisabledReasonCategory,
    pub message: String,
}

impl CachingDisabledReason {
    pub fn new(category: CachingDisabledReasonCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl fmt::Display for CachingDisabledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

/// A task's own verdict on whether its outputs may be cached
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cacheability {
    #[default]
    Cacheable,
    NotCacheable { reason: String },
}

impl Cacheability {
    pub fn not_cacheable(reason: impl Into<String>) -> Self {
        Cacheability::NotCacheable {
            reason: reason.into(),
        }
    }

    pub fn is_cacheable(&self) -> bool {
        matches!(self, Cacheability::Cacheable)
    }
}
