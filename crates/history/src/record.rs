use serde::{Deserialize, Serialize};
use stamp_core::{
    BuildCacheKey, HashAlgorithm, HashCode, ImplementationIdentity, FINGERPRINT_FORMAT_VERSION,
};
use stamp_fingerprint::PropertyFingerprints;
use std::collections::BTreeMap;

/// Everything remembered about a task's last successful execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousExecutionRecord {
    /// Layout version the fingerprints were computed with
    pub format_version: u32,
    /// Content hash algorithm the fingerprints were computed with
    pub hash_algorithm: HashAlgorithm,
    pub implementation: ImplementationIdentity,
    pub action_implementations: Vec<ImplementationIdentity>,
    pub input_value_hashes: BTreeMap<String, HashCode>,
    pub input_fingerprints: PropertyFingerprints,
    pub output_fingerprints: PropertyFingerprints,
    /// Absent when caching was disabled before a key could be computed
    pub cache_key: Option<BuildCacheKey>,
}

impl PreviousExecutionRecord {
    /// Whether the record was written with the current layout and `algorithm`
    pub fn is_compatible_with(&self, algorithm: HashAlgorithm) -> bool {
        self.format_version == FINGERPRINT_FORMAT_VERSION && self.hash_algorithm == algorithm
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use stamp_core::NormalizedPath;
    use stamp_fingerprint::{FileCollectionFingerprint, FileSystemLocationFingerprint};
    use stamp_snapshot::FileType;

    pub fn record(content: &str) -> PreviousExecutionRecord {
        let algorithm = HashAlgorithm::Sha256;
        let mut sources = FileCollectionFingerprint::new();
        sources.insert(FileSystemLocationFingerprint::new(
            NormalizedPath::new("Foo.java"),
            FileType::RegularFile,
            algorithm.hash_bytes(content.as_bytes()),
        ));
        let mut input_fingerprints = PropertyFingerprints::new();
        input_fingerprints.insert("sources".to_string(), sources);

        PreviousExecutionRecord {
            format_version: FINGERPRINT_FORMAT_VERSION,
            hash_algorithm: algorithm,
            implementation: ImplementationIdentity::new("JavaCompile", algorithm.hash_bytes(b"v1")),
            action_implementations: Vec::new(),
            input_value_hashes: BTreeMap::new(),
            input_fingerprints,
            output_fingerprints: PropertyFingerprints::new(),
            cache_key: Some(BuildCacheKey::new(algorithm.hash_bytes(content.as_bytes()))),
        }
    }
}
