//! One execution attempt of a task
//!
//! A [`TaskExecution`] holds the state captured by
//! [`ExecutionEngine::begin`]. It answers whether the task is up to date and,
//! after the task ran successfully, records the new state with
//! [`TaskExecution::commit_success`]. Dropping it without committing leaves
//! the history untouched.

use crate::engine::ExecutionEngine;
use serde::Serialize;
use stamp_cache::{BeforeExecutionState, CachingState};
use stamp_core::{NormalizedPath, TaskIdentity, FINGERPRINT_FORMAT_VERSION};
use stamp_fingerprint::{
    detect_changes, filter_output_fingerprint, Change, OverlappingOutputs, PropertyFingerprints,
    PropertyKind,
};
use stamp_history::PreviousExecutionRecord;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

const NO_HISTORY: &str = "No history is available.";

/// Outcome of an up-to-date check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpToDateResult {
    pub up_to_date: bool,
    /// Why the task must run, most significant first; empty when up to date
    pub out_of_date_messages: Vec<String>,
}

pub struct TaskExecution<'e> {
    engine: &'e ExecutionEngine,
    identity: TaskIdentity,
    outputs: BTreeMap<String, PathBuf>,
    previous: Option<PreviousExecutionRecord>,
    caching_state: CachingState,
    failure: Option<String>,
}

impl<'e> TaskExecution<'e> {
    pub(crate) fn new(
        engine: &'e ExecutionEngine,
        identity: TaskIdentity,
        outputs: BTreeMap<String, PathBuf>,
        previous: Option<PreviousExecutionRecord>,
        caching_state: CachingState,
        failure: Option<String>,
    ) -> Self {
        Self {
            engine,
            identity,
            outputs,
            previous,
            caching_state,
            failure,
        }
    }

    pub fn identity(&self) -> &TaskIdentity {
        &self.identity
    }

    pub fn caching_state(&self) -> &CachingState {
        &self.caching_state
    }

    pub fn into_caching_state(self) -> CachingState {
        self.caching_state
    }

    pub fn previous_record(&self) -> Option<&PreviousExecutionRecord> {
        self.previous.as_ref()
    }

    pub fn overlapping_outputs(&self) -> Option<&OverlappingOutputs> {
        self.caching_state
            .before_execution_state()
            .and_then(|before| before.overlapping_outputs.as_ref())
    }

    /// Compare the captured state with the previous execution
    pub fn up_to_date(&self) -> UpToDateResult {
        let mut messages = self.out_of_date_messages();
        messages.truncate(self.engine.config().max_out_of_date_messages);

        let result = UpToDateResult {
            up_to_date: messages.is_empty(),
            out_of_date_messages: messages,
        };
        stamp_utils::tracing::up_to_date_event(
            self.identity.as_str(),
            result.up_to_date,
            result.out_of_date_messages.len(),
        );
        result
    }

    fn out_of_date_messages(&self) -> Vec<String> {
        if let Some(failure) = &self.failure {
            return vec![failure.clone()];
        }
        let Some(previous) = &self.previous else {
            return vec![NO_HISTORY.to_string()];
        };
        let Some(before) = self.caching_state.before_execution_state() else {
            return vec![format!("State of task '{}' could not be determined.", self.identity)];
        };

        let mut messages = Vec::new();
        if before.output_property_names.is_empty() {
            messages.push(format!("Task '{}' has not declared any outputs.", self.identity));
        }
        self.implementation_messages(previous, before, &mut messages);
        input_value_messages(previous, before, &mut messages);

        // Property set changes before file changes
        let (property_changes, file_changes): (Vec<Change>, Vec<Change>) = detect_changes(
            PropertyKind::Output,
            &previous.output_fingerprints,
            &before.output_fingerprints,
        )
        .into_iter()
        .partition(|change| matches!(change, Change::Property { .. }));
        messages.extend(property_changes.iter().map(ToString::to_string));
        messages.extend(file_changes.iter().map(ToString::to_string));

        messages.extend(
            detect_changes(
                PropertyKind::Input,
                &previous.input_fingerprints,
                &before.input_fingerprints,
            )
            .iter()
            .map(ToString::to_string),
        );
        messages
    }

    fn implementation_messages(
        &self,
        previous: &PreviousExecutionRecord,
        before: &BeforeExecutionState,
        messages: &mut Vec<String>,
    ) {
        let current = &before.implementation;
        if !current.is_known() {
            messages.push(format!(
                "The implementation of task '{}' is unknown.",
                self.identity
            ));
        } else if previous.implementation.type_name != current.type_name {
            messages.push(format!(
                "Task '{}' has changed type from '{}' to '{}'.",
                self.identity, previous.implementation.type_name, current.type_name
            ));
        } else if previous.implementation != *current {
            messages.push(format!(
                "The implementation of task '{}' has changed.",
                self.identity
            ));
        }

        if before.action_implementations.iter().any(|a| !a.is_known()) {
            messages.push(format!(
                "One or more actions of task '{}' have an unknown implementation.",
                self.identity
            ));
        } else if previous.action_implementations != before.action_implementations {
            messages.push(format!(
                "One or more actions of task '{}' have changed.",
                self.identity
            ));
        }
    }

    /// Record the state after a successful execution.
    ///
    /// Outputs are snapshotted again. When overlapping outputs were detected
    /// beforehand, only entries this task produced are recorded.
    #[instrument(skip(self), fields(task = %self.identity))]
    pub fn commit_success(self) -> stamp_core::Result<()> {
        let history = self.engine.history();
        let Some(before) = self.caching_state.before_execution_state() else {
            warn!("no fingerprints were captured before execution, discarding history");
            return history.remove(&self.identity);
        };

        let after = match self.engine.snapshot_outputs(&self.outputs) {
            Ok((_, fingerprints)) => fingerprints,
            Err(e) => {
                history.remove(&self.identity)?;
                return Err(e);
            }
        };

        let output_fingerprints = if before.overlapping_outputs.is_some() {
            self.attributed_outputs(before, after)
        } else {
            after
        };

        let record = PreviousExecutionRecord {
            format_version: FINGERPRINT_FORMAT_VERSION,
            hash_algorithm: self.engine.algorithm(),
            implementation: before.implementation.clone(),
            action_implementations: before.action_implementations.clone(),
            input_value_hashes: before.input_value_hashes.clone(),
            input_fingerprints: before.input_fingerprints.clone(),
            output_fingerprints,
            cache_key: self.caching_state.key().cloned(),
        };
        history.store(&self.identity, record)?;
        info!(cache_enabled = self.caching_state.is_enabled(), "recorded successful execution");
        Ok(())
    }

    /// Abandon the attempt without touching the history
    pub fn discard(self) {
        debug!(task = %self.identity, "execution discarded");
    }

    fn attributed_outputs(
        &self,
        before: &BeforeExecutionState,
        after: PropertyFingerprints,
    ) -> PropertyFingerprints {
        after
            .into_iter()
            .map(|(name, after)| {
                let recorded = self
                    .previous
                    .as_ref()
                    .and_then(|record| record.output_fingerprints.get(&name));
                let filtered = match (self.outputs.get(&name), before.output_fingerprints.get(&name)) {
                    (Some(root), Some(before)) => filter_output_fingerprint(
                        &NormalizedPath::absolute(root),
                        recorded,
                        before,
                        &after,
                    ),
                    _ => after,
                };
                (name, filtered)
            })
            .collect()
    }
}

fn input_value_messages(
    previous: &PreviousExecutionRecord,
    before: &BeforeExecutionState,
    messages: &mut Vec<String>,
) {
    let mut previous_iter = previous.input_value_hashes.iter().peekable();
    let mut current_iter = before.input_value_hashes.iter().peekable();
    loop {
        let order = match (previous_iter.peek(), current_iter.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((p, _)), Some((c, _))) => p.cmp(c),
        };
        match order {
            Ordering::Less => {
                if let Some((name, _)) = previous_iter.next() {
                    messages.push(format!("Input property '{name}' has been removed."));
                }
            }
            Ordering::Greater => {
                if let Some((name, _)) = current_iter.next() {
                    messages.push(format!("Input property '{name}' has been added."));
                }
            }
            Ordering::Equal => {
                if let (Some((name, was)), Some((_, now))) = (previous_iter.next(), current_iter.next()) {
                    if was != now {
                        messages.push(format!("Value of input property '{name}' has changed."));
                    }
                }
            }
        }
    }
}
