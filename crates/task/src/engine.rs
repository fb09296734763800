//! The execution engine
//!
//! Wires snapshots, fingerprints, overlap detection, the cache key
//! calculator and the history store together. Every call is synchronous and
//! the engine is `Sync`, so independent tasks may be checked from several
//! threads at once.

use crate::definition::{InputFileProperty, Task};
use crate::execution::{TaskExecution, UpToDateResult};
use stamp_cache::{
    hash_input_value, BeforeExecutionState, BuildCacheKeyCalculator, CachingPreconditions,
    CachingState,
};
use stamp_config::EngineConfig;
use stamp_core::{
    Error, HashAlgorithm, HasherRegistry, NormalizationStrategy, PathNormalizer, Result,
    TaskIdentity,
};
use stamp_fingerprint::{fingerprint_property, OverlappingOutputDetector, PropertyFingerprints};
use stamp_history::{ExecutionHistoryStore, FileHistoryStore, PreviousExecutionRecord};
use stamp_snapshot::{DirectorySnapshotter, ExcludeRuleCache, SnapshotTree};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub struct ExecutionEngine {
    config: EngineConfig,
    algorithm: HashAlgorithm,
    calculator: BuildCacheKeyCalculator,
    history: Arc<dyn ExecutionHistoryStore>,
    exclude_rules: ExcludeRuleCache,
}

impl ExecutionEngine {
    /// Engine using the hash algorithm named in `config`
    pub fn new(config: EngineConfig, history: Arc<dyn ExecutionHistoryStore>) -> Result<Self> {
        let registry = config.hasher_registry()?;
        Ok(Self::with_registry(config, &registry, history))
    }

    /// Engine using the default algorithm of an existing registry
    pub fn with_registry(
        config: EngineConfig,
        registry: &HasherRegistry,
        history: Arc<dyn ExecutionHistoryStore>,
    ) -> Self {
        let algorithm = registry.default_algorithm();
        Self {
            config,
            algorithm,
            calculator: BuildCacheKeyCalculator::new(algorithm),
            history,
            exclude_rules: ExcludeRuleCache::new(),
        }
    }

    /// Engine persisting history under `config.history_dir`
    pub fn with_file_history(config: EngineConfig) -> Result<Self> {
        let history = Arc::new(FileHistoryStore::new(config.history_dir.clone()));
        Self::new(config, history)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn history(&self) -> &dyn ExecutionHistoryStore {
        self.history.as_ref()
    }

    /// Capture the state of `task` before it executes.
    ///
    /// Configuration problems such as a path outside its declared root are
    /// returned as errors. Filesystem failures do not fail the call: they
    /// disable caching and make the task out of date.
    #[instrument(skip_all, fields(task = %task.identity()))]
    pub fn begin(&self, task: &dyn Task) -> Result<TaskExecution<'_>> {
        let identity = task.identity();
        let previous = self.load_previous(&identity);
        let inputs = task.declared_input_properties();
        let outputs = task.declared_output_properties();

        let preconditions = CachingPreconditions {
            cacheability: task.cacheability(),
            build_cache_enabled: self.config.build_cache_enabled,
            validation_failures: validate_declarations(&inputs, &outputs),
        };

        let before = match self.capture_before_execution(task, &inputs, &outputs, previous.as_ref())
        {
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "failed to fingerprint task");
                Err(e)
            }
            Ok(before) => Ok(before),
        };
        let failure = before
            .as_ref()
            .err()
            .map(|e| format!("Fingerprinting failed: {e}"));

        let caching_state =
            self.calculator
                .calculate(before, &preconditions, &CachingState::not_determined());

        Ok(TaskExecution::new(
            self,
            identity,
            outputs,
            previous,
            caching_state,
            failure,
        ))
    }

    /// Whether `task` can skip execution, and if not, why
    pub fn is_up_to_date(&self, task: &dyn Task) -> Result<UpToDateResult> {
        Ok(self.begin(task)?.up_to_date())
    }

    pub fn caching_state(&self, task: &dyn Task) -> Result<CachingState> {
        Ok(self.begin(task)?.into_caching_state())
    }

    /// Drop the recorded history of `task`
    pub fn forget(&self, task: &TaskIdentity) -> Result<()> {
        self.history.remove(task)
    }

    fn load_previous(&self, identity: &TaskIdentity) -> Option<PreviousExecutionRecord> {
        let record = self.history.load(identity)?;
        if record.is_compatible_with(self.algorithm) {
            return Some(record);
        }
        let error = Error::history_corruption(
            identity.as_str(),
            format!(
                "recorded with format version {} and algorithm {}",
                record.format_version, record.hash_algorithm
            ),
        );
        warn!(error = %error, "ignoring incompatible execution history");
        None
    }

    fn capture_before_execution(
        &self,
        task: &dyn Task,
        inputs: &BTreeMap<String, InputFileProperty>,
        outputs: &BTreeMap<String, PathBuf>,
        previous: Option<&PreviousExecutionRecord>,
    ) -> Result<BeforeExecutionState> {
        let mut input_fingerprints = PropertyFingerprints::new();
        for (name, property) in inputs {
            let tree = self.snapshotter(&property.excludes)?.snapshot(&property.root)?;
            let normalizer = PathNormalizer::new(property.strategy, &property.root);
            input_fingerprints.insert(name.clone(), fingerprint_property(name, &tree, &normalizer)?);
        }

        let mut input_value_hashes = BTreeMap::new();
        for (name, value) in task.declared_input_values() {
            let hash = hash_input_value(self.algorithm, &value)?;
            input_value_hashes.insert(name, hash);
        }

        let (output_trees, output_fingerprints) = self.snapshot_outputs(outputs)?;
        let no_history = PropertyFingerprints::new();
        let recorded_outputs = previous.map_or(&no_history, |record| &record.output_fingerprints);
        let overlapping_outputs = OverlappingOutputDetector::detect(recorded_outputs, &output_trees);

        Ok(BeforeExecutionState {
            implementation: task.implementation_identity(),
            action_implementations: task.action_identities(),
            input_value_hashes,
            input_fingerprints,
            output_fingerprints,
            output_property_names: outputs.keys().cloned().collect(),
            overlapping_outputs,
        })
    }

    /// Snapshot and fingerprint output roots by absolute path
    pub(crate) fn snapshot_outputs(
        &self,
        outputs: &BTreeMap<String, PathBuf>,
    ) -> Result<(BTreeMap<String, SnapshotTree>, PropertyFingerprints)> {
        let snapshotter = self.snapshotter(&[])?;
        let mut trees = BTreeMap::new();
        let mut fingerprints = PropertyFingerprints::new();
        for (name, root) in outputs {
            let tree = snapshotter.snapshot(root)?;
            let normalizer = PathNormalizer::new(NormalizationStrategy::Absolute, root);
            fingerprints.insert(name.clone(), fingerprint_property(name, &tree, &normalizer)?);
            trees.insert(name.clone(), tree);
        }
        Ok((trees, fingerprints))
    }

    fn snapshotter(&self, extra_excludes: &[String]) -> Result<DirectorySnapshotter> {
        let excludes = self
            .exclude_rules
            .merge(&self.config.default_excludes, extra_excludes)?;
        debug!(patterns = excludes.patterns().len(), "exclude rules");
        Ok(DirectorySnapshotter::new(self.algorithm, excludes))
    }
}

fn validate_declarations(
    inputs: &BTreeMap<String, InputFileProperty>,
    outputs: &BTreeMap<String, PathBuf>,
) -> Vec<String> {
    let mut failures = Vec::new();
    for (name, property) in inputs {
        if property.root.is_relative() {
            failures.push(format!(
                "Input property '{name}' has a relative root '{}'",
                property.root.display()
            ));
        }
    }
    for (name, root) in outputs {
        if root.is_relative() {
            failures.push(format!(
                "Output property '{name}' has a relative root '{}'",
                root.display()
            ));
        }
    }
    failures
}
