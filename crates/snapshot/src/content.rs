//! Content identity of a single filesystem entry

use serde::{Deserialize, Serialize};
use stamp_core::{HashAlgorithm, HashCode};
use std::fmt;

/// Type of a filesystem entry at snapshot time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    RegularFile,
    Directory,
    Missing,
}

impl FileType {
    /// One-byte tag written into aggregate hashes
    pub fn tag(self) -> u8 {
        match self {
            FileType::RegularFile => 0,
            FileType::Directory => 1,
            FileType::Missing => 2,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileType::RegularFile => "file",
            FileType::Directory => "directory",
            FileType::Missing => "missing",
        })
    }
}

const DIRECTORY_SIGNATURE: &[u8] = b"DIR";
const MISSING_SIGNATURE: &[u8] = b"MISSING";

/// What an entry contained when it was snapshotted.
///
/// Only the bytes of a regular file take part in its identity; timestamps,
/// size and permissions never do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "hash", rename_all = "snake_case")]
pub enum ContentSnapshot {
    RegularFile(HashCode),
    Directory,
    Missing,
}

impl ContentSnapshot {
    pub fn file_type(&self) -> FileType {
        match self {
            ContentSnapshot::RegularFile(_) => FileType::RegularFile,
            ContentSnapshot::Directory => FileType::Directory,
            ContentSnapshot::Missing => FileType::Missing,
        }
    }

    pub fn content_hash(&self) -> Option<&HashCode> {
        match self {
            ContentSnapshot::RegularFile(hash) => Some(hash),
            ContentSnapshot::Directory | ContentSnapshot::Missing => None,
        }
    }

    /// Hash used in fingerprints; directories and missing entries hash a fixed signature
    pub fn normalized_content_hash(&self, algorithm: HashAlgorithm) -> HashCode {
        match self {
            ContentSnapshot::RegularFile(hash) => hash.clone(),
            ContentSnapshot::Directory => algorithm.hash_bytes(DIRECTORY_SIGNATURE),
            ContentSnapshot::Missing => algorithm.hash_bytes(MISSING_SIGNATURE),
        }
    }

    /// Same type and, for files, same content
    pub fn is_content_up_to_date(&self, other: &ContentSnapshot) -> bool {
        self == other
    }
}
