use serde::{Deserialize, Serialize};
use stamp_core::{HashCode, NormalizationStrategy, NormalizedPath, PathNormalizer, Result};
use stamp_snapshot::{FileType, SnapshotTree};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Fingerprints of several properties, keyed by property name
pub type PropertyFingerprints = BTreeMap<String, FileCollectionFingerprint>;

/// Fingerprint of one entry under its normalized path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileSystemLocationFingerprint {
    pub normalized_path: NormalizedPath,
    pub file_type: FileType,
    pub normalized_content_hash: HashCode,
}

impl FileSystemLocationFingerprint {
    pub fn new(
        normalized_path: NormalizedPath,
        file_type: FileType,
        normalized_content_hash: HashCode,
    ) -> Self {
        Self {
            normalized_path,
            file_type,
            normalized_content_hash,
        }
    }

    /// Same type and content, ignoring the path
    pub fn is_content_up_to_date(&self, other: &FileSystemLocationFingerprint) -> bool {
        self.file_type == other.file_type
            && self.normalized_content_hash == other.normalized_content_hash
    }
}

/// Sorted mapping from normalized path to fingerprint.
///
/// Serializes as a list in path order, so two equal collections always
/// produce the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FileSystemLocationFingerprint>", into = "Vec<FileSystemLocationFingerprint>")]
pub struct FileCollectionFingerprint {
    fingerprints: BTreeMap<NormalizedPath, FileSystemLocationFingerprint>,
}

impl FileCollectionFingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; an existing entry with the same path is replaced
    pub fn insert(&mut self, fingerprint: FileSystemLocationFingerprint) {
        self.fingerprints
            .insert(fingerprint.normalized_path.clone(), fingerprint);
    }

    pub fn get(&self, path: &NormalizedPath) -> Option<&FileSystemLocationFingerprint> {
        self.fingerprints.get(path)
    }

    pub fn contains(&self, path: &NormalizedPath) -> bool {
        self.fingerprints.contains_key(path)
    }

    /// Entries in normalized path order
    pub fn iter(&self) -> impl Iterator<Item = &FileSystemLocationFingerprint> + '_ {
        self.fingerprints.values()
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

impl From<Vec<FileSystemLocationFingerprint>> for FileCollectionFingerprint {
    fn from(entries: Vec<FileSystemLocationFingerprint>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<FileCollectionFingerprint> for Vec<FileSystemLocationFingerprint> {
    fn from(collection: FileCollectionFingerprint) -> Self {
        collection.fingerprints.into_values().collect()
    }
}

impl FromIterator<FileSystemLocationFingerprint> for FileCollectionFingerprint {
    fn from_iter<T: IntoIterator<Item = FileSystemLocationFingerprint>>(iter: T) -> Self {
        let mut collection = Self::new();
        for fingerprint in iter {
            collection.insert(fingerprint);
        }
        collection
    }
}

/// Fingerprint the entries of `tree` for the property `name`.
///
/// Entries are normalized in depth-first name order. When two entries
/// normalize to the same path the one visited last is kept. Under
/// [`NormalizationStrategy::Ignored`] the whole tree collapses into a single
/// entry whose hash covers the sorted content hashes of its regular files.
#[instrument(skip(tree, normalizer), fields(root = %tree.root_path().display(), strategy = %normalizer.strategy()))]
pub fn fingerprint_property(
    name: &str,
    tree: &SnapshotTree,
    normalizer: &PathNormalizer,
) -> Result<FileCollectionFingerprint> {
    let algorithm = tree.algorithm();
    let mut collection = FileCollectionFingerprint::new();

    match normalizer.strategy() {
        NormalizationStrategy::Ignored => {
            let mut file_hashes: Vec<&HashCode> = tree
                .entries()
                .filter_map(|node| node.content().content_hash())
                .collect();
            file_hashes.sort();

            let (file_type, hash) = if file_hashes.is_empty() {
                let root = tree.root();
                (
                    root.file_type(),
                    root.content().normalized_content_hash(algorithm),
                )
            } else {
                let mut hasher = algorithm.hasher();
                hasher.put_u32(file_hashes.len() as u32);
                for hash in &file_hashes {
                    hasher.put_hash(hash);
                }
                (FileType::RegularFile, hasher.finish())
            };
            normalizer.normalize(tree.root_path())?;
            collection.insert(FileSystemLocationFingerprint::new(
                NormalizedPath::new(""),
                file_type,
                hash,
            ));
        }
        strategy => {
            for node in tree.entries() {
                let is_root_file = std::ptr::eq(node, tree.root())
                    && node.file_type() == FileType::RegularFile;
                let normalized_path = if strategy == NormalizationStrategy::Relative && is_root_file {
                    // A file declared directly has no path below itself
                    NormalizedPath::new(node.name())
                } else {
                    normalizer.normalize(node.path())?
                };
                collection.insert(FileSystemLocationFingerprint::new(
                    normalized_path,
                    node.file_type(),
                    node.content().normalized_content_hash(algorithm),
                ));
            }
        }
    }

    debug!(property = %name, entries = collection.len(), "fingerprinted property");
    Ok(collection)
}
