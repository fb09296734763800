//! Differences between two sets of property fingerprints

use crate::fingerprint::{FileCollectionFingerprint, PropertyFingerprints};
use stamp_core::NormalizedPath;
use std::cmp::Ordering;
use std::fmt;

/// Whether a property is an input or an output of the task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Input,
    Output,
}

impl PropertyKind {
    fn title(self) -> &'static str {
        match self {
            PropertyKind::Input => "Input",
            PropertyKind::Output => "Output",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::Modified => "modified",
        })
    }
}

/// One reason a task's files differ from its previous execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A whole property appeared or disappeared
    Property {
        kind: PropertyKind,
        property: String,
        change: ChangeKind,
    },
    /// An entry within a property changed
    File {
        kind: PropertyKind,
        property: String,
        path: NormalizedPath,
        change: ChangeKind,
    },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Property {
                kind,
                property,
                change,
            } => write!(f, "{} property '{}' has been {}.", kind.title(), property, change),
            Change::File {
                kind,
                property,
                path,
                change,
            } => write!(
                f,
                "{} property '{}' file {} has been {}.",
                kind.title(),
                property,
                path,
                change
            ),
        }
    }
}

/// Changes from `previous` to `current`, in property then path order
pub fn detect_changes(
    kind: PropertyKind,
    previous: &PropertyFingerprints,
    current: &PropertyFingerprints,
) -> Vec<Change> {
    let mut changes = Vec::new();
    let mut previous_iter = previous.iter().peekable();
    let mut current_iter = current.iter().peekable();

    loop {
        let order = match (previous_iter.peek(), current_iter.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((p, _)), Some((c, _))) => p.cmp(c),
        };
        match order {
            Ordering::Less => {
                if let Some((property, _)) = previous_iter.next() {
                    changes.push(Change::Property {
                        kind,
                        property: property.clone(),
                        change: ChangeKind::Removed,
                    });
                }
            }
            Ordering::Greater => {
                if let Some((property, _)) = current_iter.next() {
                    changes.push(Change::Property {
                        kind,
                        property: property.clone(),
                        change: ChangeKind::Added,
                    });
                }
            }
            Ordering::Equal => {
                if let (Some((property, before)), Some((_, after))) =
                    (previous_iter.next(), current_iter.next())
                {
                    diff_collection(kind, property, before, after, &mut changes);
                }
            }
        }
    }

    changes
}

fn diff_collection(
    kind: PropertyKind,
    property: &str,
    before: &FileCollectionFingerprint,
    after: &FileCollectionFingerprint,
    changes: &mut Vec<Change>,
) {
    let file = |path: &NormalizedPath, change| Change::File {
        kind,
        property: property.to_string(),
        path: path.clone(),
        change,
    };

    for entry in before.iter() {
        match after.get(&entry.normalized_path) {
            None => changes.push(file(&entry.normalized_path, ChangeKind::Removed)),
            Some(current) if !current.is_content_up_to_date(entry) => {
                changes.push(file(&entry.normalized_path, ChangeKind::Modified))
            }
            Some(_) => {}
        }
    }
    for entry in after.iter() {
        if !before.contains(&entry.normalized_path) {
            changes.push(file(&entry.normalized_path, ChangeKind::Added));
        }
    }
}
