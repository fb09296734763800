//! Detection of output content the task did not produce itself
//!
//! Before a task runs, its current outputs are compared with the fingerprint
//! recorded after its own previous execution. Anything new or different was
//! written by someone else, typically another task sharing the directory,
//! and makes the outputs unsafe to cache.

use crate::fingerprint::{FileCollectionFingerprint, PropertyFingerprints};
use stamp_core::NormalizedPath;
use stamp_snapshot::{SnapshotNode, SnapshotTree, VisitAction};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, instrument};

/// First foreign entry found among a task's outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlappingOutputs {
    pub property_name: String,
    pub overlapping_path: String,
}

impl OverlappingOutputs {
    pub fn new(property_name: impl Into<String>, overlapping_path: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            overlapping_path: overlapping_path.into(),
        }
    }
}

impl fmt::Display for OverlappingOutputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Output property '{}' has overlapping content at '{}'",
            self.property_name, self.overlapping_path
        )
    }
}

pub struct OverlappingOutputDetector;

impl OverlappingOutputDetector {
    /// Compare current output trees with the previous output fingerprints.
    ///
    /// Previous fingerprints are keyed by absolute path. Properties are
    /// checked in name order and the walk stops at the first new entry. A
    /// property whose root does not exist never overlaps.
    #[instrument(skip_all, fields(properties = current.len()))]
    pub fn detect(
        previous: &PropertyFingerprints,
        current: &BTreeMap<String, SnapshotTree>,
    ) -> Option<OverlappingOutputs> {
        let empty = FileCollectionFingerprint::new();
        for (property, tree) in current {
            if tree.is_missing() {
                continue;
            }
            let recorded = previous.get(property).unwrap_or(&empty);

            let mut found = None;
            tree.accept(&mut |node: &SnapshotNode, _depth: usize| {
                if is_new_content(node, recorded, tree) {
                    found = Some(NormalizedPath::absolute(node.path()));
                    VisitAction::Terminate
                } else {
                    VisitAction::Continue
                }
            });

            if let Some(path) = found {
                let overlap = OverlappingOutputs::new(property.as_str(), path.as_str());
                debug!(property = %property, path = %path, "overlapping outputs detected");
                return Some(overlap);
            }
        }
        None
    }
}

fn is_new_content(node: &SnapshotNode, recorded: &FileCollectionFingerprint, tree: &SnapshotTree) -> bool {
    let path = NormalizedPath::absolute(node.path());
    match recorded.get(&path) {
        None => true,
        Some(previous) => {
            previous.file_type != node.file_type()
                || previous.normalized_content_hash
                    != node.content().normalized_content_hash(tree.algorithm())
        }
    }
}
