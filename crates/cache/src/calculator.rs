//! Build cache key calculation
//!
//! The key covers, in order: the fingerprint format version, the hash
//! algorithm name, the task implementation, every action implementation,
//! the input value hashes, the aggregate hash of the input file
//! fingerprints and the sorted output property names. Output file contents
//! never take part, since outputs are what the key addresses.

use crate::reason::{Cacheability, CachingDisabledReason, CachingDisabledReasonCategory};
use crate::state::{BeforeExecutionState, CachingState};
use stamp_core::{
    BuildCacheKey, Error, HashAlgorithm, HashCode, Result, FINGERPRINT_FORMAT_VERSION,
};
use stamp_fingerprint::combine;
use tracing::{debug, info, instrument};

/// Hash a declared input value through its canonical JSON form
pub fn hash_input_value(algorithm: HashAlgorithm, value: &serde_json::Value) -> Result<HashCode> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| Error::json("failed to serialize input value", e))?;
    Ok(algorithm.hash_bytes(&bytes))
}

/// Facts about the task and build that decide cacheability besides the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachingPreconditions {
    pub cacheability: Cacheability,
    pub build_cache_enabled: bool,
    /// Problems found while validating the task's declarations
    pub validation_failures: Vec<String>,
}

impl Default for CachingPreconditions {
    fn default() -> Self {
        Self {
            cacheability: Cacheability::Cacheable,
            build_cache_enabled: true,
            validation_failures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildCacheKeyCalculator {
    algorithm: HashAlgorithm,
}

impl BuildCacheKeyCalculator {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn compute_key(&self, before: &BeforeExecutionState) -> BuildCacheKey {
        let mut hasher = self.algorithm.hasher();
        hasher.put_u32(FINGERPRINT_FORMAT_VERSION);
        hasher.put_str(self.algorithm.name());

        before.implementation.append_to(&mut hasher);
        hasher.put_u32(before.action_implementations.len() as u32);
        for action in &before.action_implementations {
            action.append_to(&mut hasher);
        }

        hasher.put_u32(before.input_value_hashes.len() as u32);
        for (name, hash) in &before.input_value_hashes {
            hasher.put_str(name);
            hasher.put_hash(hash);
        }

        hasher.put_hash(&combine(self.algorithm, &before.input_fingerprints));

        hasher.put_u32(before.output_property_names.len() as u32);
        for name in &before.output_property_names {
            hasher.put_str(name);
        }

        BuildCacheKey::new(hasher.finish())
    }

    /// Decide the caching state for one execution attempt.
    ///
    /// An already determined `previous` state is returned unchanged. A
    /// fingerprinting failure in `before` disables caching with a
    /// `ValidationFailure` reason instead of propagating.
    #[instrument(skip_all)]
    pub fn calculate(
        &self,
        before: Result<BeforeExecutionState>,
        preconditions: &CachingPreconditions,
        previous: &CachingState,
    ) -> CachingState {
        if !previous.is_not_determined() {
            return previous.clone();
        }

        let before = match before {
            Ok(before) => before,
            Err(e) => {
                info!(error = %e, "caching disabled: fingerprinting failed");
                return CachingState::disabled(
                    vec![CachingDisabledReason::new(
                        CachingDisabledReasonCategory::ValidationFailure,
                        format!("Fingerprinting failed: {e}"),
                    )],
                    None,
                );
            }
        };

        let key = self.compute_key(&before);
        debug!(key = %key, "build cache key calculated");

        let reasons = disabled_reasons(&before, preconditions);
        if reasons.is_empty() {
            CachingState::enabled(key, before)
        } else {
            for reason in &reasons {
                info!(category = %reason.category, message = %reason.message, "caching disabled");
            }
            CachingState::disabled(reasons, Some((key, before)))
        }
    }
}

fn disabled_reasons(
    before: &BeforeExecutionState,
    preconditions: &CachingPreconditions,
) -> Vec<CachingDisabledReason> {
    use CachingDisabledReasonCategory as Category;

    let mut reasons = Vec::new();
    if let Cacheability::NotCacheable { reason } = &preconditions.cacheability {
        reasons.push(CachingDisabledReason::new(Category::NotCacheable, reason.clone()));
    }
    if !preconditions.build_cache_enabled {
        reasons.push(CachingDisabledReason::new(
            Category::BuildCacheDisabled,
            "Build cache is disabled",
        ));
    }
    if before.output_property_names.is_empty() {
        reasons.push(CachingDisabledReason::new(
            Category::NoOutputsDeclared,
            "No outputs declared",
        ));
    }
    if !before.implementation.is_known() {
        reasons.push(CachingDisabledReason::new(
            Category::Unknown,
            format!(
                "Implementation of type '{}' is unknown",
                before.implementation.type_name
            ),
        ));
    }
    for action in &before.action_implementations {
        if !action.is_known() {
            reasons.push(CachingDisabledReason::new(
                Category::Unknown,
                format!("Implementation of action '{}' is unknown", action.type_name),
            ));
        }
    }
    if let Some(overlap) = &before.overlapping_outputs {
        reasons.push(CachingDisabledReason::new(
            Category::OverlappingOutputs,
            overlap.to_string(),
        ));
    }
    for failure in &preconditions.validation_failures {
        reasons.push(CachingDisabledReason::new(
            Category::ValidationFailure,
            failure.clone(),
        ));
    }
    reasons
}
