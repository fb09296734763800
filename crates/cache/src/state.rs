//! The caching decision for one execution attempt

use crate::reason::{CachingDisabledReason, CachingDisabledReasonCategory};
use stamp_core::{BuildCacheKey, HashCode, ImplementationIdentity};
use stamp_fingerprint::{OverlappingOutputs, PropertyFingerprints};
use std::collections::{BTreeMap, BTreeSet};

const NOT_DETERMINED_MESSAGE: &str = "Cacheability was not determined";

/// Everything known about a task right before it executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeforeExecutionState {
    pub implementation: ImplementationIdentity,
    pub action_implementations: Vec<ImplementationIdentity>,
    pub input_value_hashes: BTreeMap<String, HashCode>,
    pub input_fingerprints: PropertyFingerprints,
    pub output_fingerprints: PropertyFingerprints,
    pub output_property_names: BTreeSet<String>,
    pub overlapping_outputs: Option<OverlappingOutputs>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledCachingState {
    pub key: BuildCacheKey,
    pub before_execution: BeforeExecutionState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisabledCachingState {
    reasons: Vec<CachingDisabledReason>,
    key_calculated: Option<(BuildCacheKey, BeforeExecutionState)>,
}

impl DisabledCachingState {
    /// Never empty
    pub fn reasons(&self) -> &[CachingDisabledReason] {
        &self.reasons
    }

    /// Key and state, when fingerprinting got far enough to compute them
    pub fn key_calculated(&self) -> Option<(&BuildCacheKey, &BeforeExecutionState)> {
        self.key_calculated.as_ref().map(|(key, state)| (key, state))
    }
}

/// Whether the outputs of an execution may be stored in or loaded from a build cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachingState {
    Enabled(EnabledCachingState),
    Disabled(DisabledCachingState),
}

impl CachingState {
    pub fn enabled(key: BuildCacheKey, before_execution: BeforeExecutionState) -> Self {
        CachingState::Enabled(EnabledCachingState {
            key,
            before_execution,
        })
    }

    /// Disabled state; an empty `reasons` list is replaced by an `Unknown` reason
    pub fn disabled(
        mut reasons: Vec<CachingDisabledReason>,
        key_calculated: Option<(BuildCacheKey, BeforeExecutionState)>,
    ) -> Self {
        if reasons.is_empty() {
            reasons.push(CachingDisabledReason::new(
                CachingDisabledReasonCategory::Unknown,
                "Caching was disabled without a reason",
            ));
        }
        CachingState::Disabled(DisabledCachingState {
            reasons,
            key_calculated,
        })
    }

    /// State before any calculation has happened
    pub fn not_determined() -> Self {
        Self::disabled(
            vec![CachingDisabledReason::new(
                CachingDisabledReasonCategory::Unknown,
                NOT_DETERMINED_MESSAGE,
            )],
            None,
        )
    }

    pub fn is_not_determined(&self) -> bool {
        match self {
            CachingState::Enabled(_) => false,
            CachingState::Disabled(disabled) => {
                disabled.key_calculated.is_none()
                    && matches!(
                        disabled.reasons.as_slice(),
                        [reason] if reason.category == CachingDisabledReasonCategory::Unknown
                            && reason.message == NOT_DETERMINED_MESSAGE
                    )
            }
        }
    }

    pub fn when_enabled(&self) -> Option<&EnabledCachingState> {
        match self {
            CachingState::Enabled(enabled) => Some(enabled),
            CachingState::Disabled(_) => None,
        }
    }

    pub fn when_disabled(&self) -> Option<&DisabledCachingState> {
        match self {
            CachingState::Enabled(_) => None,
            CachingState::Disabled(disabled) => Some(disabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, CachingState::Enabled(_))
    }

    /// The cache key, whether or not caching is enabled
    pub fn key(&self) -> Option<&BuildCacheKey> {
        match self {
            CachingState::Enabled(enabled) => Some(&enabled.key),
            CachingState::Disabled(disabled) => disabled.key_calculated.as_ref().map(|(key, _)| key),
        }
    }

    pub fn before_execution_state(&self) -> Option<&BeforeExecutionState> {
        match self {
            CachingState::Enabled(enabled) => Some(&enabled.before_execution),
            CachingState::Disabled(disabled) => {
                disabled.key_calculated.as_ref().map(|(_, state)| state)
            }
        }
    }

    /// Reasons caching is disabled; empty when enabled
    pub fn disabled_reasons(&self) -> &[CachingDisabledReason] {
        match self {
            CachingState::Enabled(_) => &[],
            CachingState::Disabled(disabled) => &disabled.reasons,
        }
    }
}

impl Default for CachingState {
    fn default() -> Self {
        Self::not_determined()
    }
}
