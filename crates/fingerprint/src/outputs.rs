//! Attribution of output entries after an execution with overlapping outputs

use crate::fingerprint::FileCollectionFingerprint;
use stamp_core::NormalizedPath;
use stamp_snapshot::FileType;
use std::collections::BTreeSet;

/// Keep only the entries of `after` that this task produced.
///
/// An entry is an output when it exists and was created during the
/// execution, was changed during the execution, or was already recorded as
/// this task's output by its previous execution. The existing `root` and
/// every directory leading to a kept entry are kept as well, so a root that
/// was created ahead of the first execution is not reported as added later.
/// When either snapshot is empty there is nothing to attribute and `after`
/// is kept whole.
pub fn filter_output_fingerprint(
    root: &NormalizedPath,
    after_previous: Option<&FileCollectionFingerprint>,
    before: &FileCollectionFingerprint,
    after: &FileCollectionFingerprint,
) -> FileCollectionFingerprint {
    if before.is_empty() || after.is_empty() {
        return after.clone();
    }

    let mut kept = BTreeSet::new();
    for entry in after.iter() {
        if entry.file_type == FileType::Missing {
            continue;
        }
        let produced = match before.get(&entry.normalized_path) {
            None => true,
            Some(previous) => {
                !entry.is_content_up_to_date(previous)
                    || after_previous
                        .is_some_and(|recorded| recorded.contains(&entry.normalized_path))
            }
        };
        if produced {
            kept.extend(ancestors(entry.normalized_path.as_str()));
        }
    }

    after
        .iter()
        .filter(|entry| {
            entry.file_type != FileType::Missing
                && (entry.normalized_path == *root
                    || kept.contains(entry.normalized_path.as_str()))
        })
        .cloned()
        .collect()
}

/// `path` and every `/`-separated prefix of it
fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/')
        .map(move |(index, _)| &path[..index])
        .filter(|prefix| !prefix.is_empty())
        .chain(std::iter::once(path))
}
