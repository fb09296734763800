//! Identities of tasks, task implementations and cache entries

use crate::hash::{HashCode, Hasher};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, path-like name of a task (for example `:app:compileJava`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskIdentity(String);

impl TaskIdentity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of the code that implements a task or one of its actions.
///
/// `code_hash` is `None` when the implementation was loaded from somewhere the
/// caller cannot fingerprint; such tasks are never cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImplementationIdentity {
    pub type_name: String,
    pub code_hash: Option<HashCode>,
}

impl ImplementationIdentity {
    pub fn new(type_name: impl Into<String>, code_hash: HashCode) -> Self {
        Self {
            type_name: type_name.into(),
            code_hash: Some(code_hash),
        }
    }

    pub fn unknown(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            code_hash: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.code_hash.is_some()
    }

    pub fn append_to(&self, hasher: &mut Hasher) {
        hasher.put_str(&self.type_name);
        match &self.code_hash {
            Some(hash) => {
                hasher.put_bool(true);
                hasher.put_hash(hash);
            }
            None => hasher.put_bool(false),
        }
    }
}

impl fmt::Display for ImplementationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code_hash {
            Some(hash) => write!(f, "{}@{}", self.type_name, hash),
            None => write!(f, "{}@<unknown>", self.type_name),
        }
    }
}

/// Aggregate hash addressing a task's cached outputs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildCacheKey(HashCode);

impl BuildCacheKey {
    pub fn new(hash: HashCode) -> Self {
        Self(hash)
    }

    pub fn hash_code(&self) -> &HashCode {
        &self.0
    }
}

impl fmt::Display for BuildCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashAlgorithm;

    #[test]
    fn test_unknown_implementation_hashes_differently() {
        let code = HashAlgorithm::Sha256.hash_bytes(b"v1");
        let known = ImplementationIdentity::new("JavaCompile", code);
        let unknown = ImplementationIdentity::unknown("JavaCompile");

        let mut a = HashAlgorithm::Sha256.hasher();
        known.append_to(&mut a);
        let mut b = HashAlgorithm::Sha256.hasher();
        unknown.append_to(&mut b);

        assert_ne!(a.finish(), b.finish());
        assert!(known.is_known());
        assert!(!unknown.is_known());
    }

    #[test]
    fn test_task_identity_serializes_as_string() {
        let identity = TaskIdentity::new(":app:compileJava");
        assert_eq!(
            serde_json::to_string(&identity).unwrap(),
            "\":app:compileJava\""
        );
    }
}
