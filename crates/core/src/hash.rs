//! Content hashing primitives
//!
//! All hashes produced by the engine go through [`Hasher`], which writes
//! variable-length values length-prefixed so that two different sequences of
//! fields can never produce the same byte stream. The algorithm is chosen once
//! from an explicit [`HasherRegistry`] and passed to whoever needs it.

use crate::constants::DEFAULT_HASH_ALGORITHM;
use crate::errors::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use xxhash_rust::xxh3::Xxh3;

/// An opaque digest, rendered as lowercase hex
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashCode(Box<[u8]>);

impl HashCode {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into().into_boxed_slice())
    }

    pub fn from_hex(value: &str) -> Result<Self> {
        let bytes = hex::decode(value)
            .map_err(|e| Error::configuration(format!("invalid hash '{value}': {e}")))?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for HashCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for HashCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashCode({})", self.to_hex())
    }
}

impl Serialize for HashCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for HashCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        hex::decode(&value)
            .map(HashCode::from_bytes)
            .map_err(serde::de::Error::custom)
    }
}

/// Content hash algorithms understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "xxh3-128")]
    Xxh3_128,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 2] = [HashAlgorithm::Sha256, HashAlgorithm::Xxh3_128];

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Xxh3_128 => "xxh3-128",
        }
    }

    /// Digest length in bytes
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Xxh3_128 => 16,
        }
    }

    pub fn hasher(self) -> Hasher {
        Hasher::new(self)
    }

    /// Hash a byte slice as-is, without a length prefix
    pub fn hash_bytes(self, bytes: &[u8]) -> HashCode {
        let mut hasher = self.hasher();
        hasher.update(bytes);
        hasher.finish()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        HashAlgorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = HashAlgorithm::ALL.iter().map(|a| a.name()).collect();
                Error::unknown_hash_algorithm(s, &known)
            })
    }
}

enum HasherState {
    Sha256(Sha256),
    Xxh3(Box<Xxh3>),
}

/// Streaming hasher with length-prefixed helpers
pub struct Hasher {
    algorithm: HashAlgorithm,
    state: HasherState,
}

impl Hasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let state = match algorithm {
            HashAlgorithm::Sha256 => HasherState::Sha256(Sha256::new()),
            HashAlgorithm::Xxh3_128 => HasherState::Xxh3(Box::new(Xxh3::new())),
        };
        Self { algorithm, state }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Feed raw bytes
    pub fn update(&mut self, bytes: &[u8]) {
        match &mut self.state {
            HasherState::Sha256(hasher) => hasher.update(bytes),
            HasherState::Xxh3(hasher) => hasher.update(bytes),
        }
    }

    pub fn put_u8(&mut self, value: u8) {
        self.update(&[value]);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.update(&value.to_le_bytes());
    }

    /// Length-prefixed (u32 little endian) byte string
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        // Lengths beyond u32::MAX are not meaningful for paths or digests.
        self.put_u32(bytes.len() as u32);
        self.update(bytes);
    }

    pub fn put_str(&mut self, value: &str) {
        self.put_bytes(value.as_bytes());
    }

    pub fn put_hash(&mut self, hash: &HashCode) {
        self.put_bytes(hash.as_bytes());
    }

    pub fn put_bool(&mut self, value: bool) {
        self.put_u8(u8::from(value));
    }

    pub fn finish(self) -> HashCode {
        match self.state {
            HasherState::Sha256(hasher) => HashCode::from_bytes(hasher.finalize().to_vec()),
            HasherState::Xxh3(hasher) => {
                HashCode::from_bytes(hasher.digest128().to_be_bytes().to_vec())
            }
        }
    }
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hasher")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Lookup of hash algorithms by name, built once at startup
#[derive(Debug, Clone)]
pub struct HasherRegistry {
    algorithms: BTreeMap<&'static str, HashAlgorithm>,
    default: HashAlgorithm,
}

impl HasherRegistry {
    /// Registry with every built-in algorithm and `sha256` as the default
    pub fn new() -> Self {
        let algorithms = HashAlgorithm::ALL
            .into_iter()
            .map(|algorithm| (algorithm.name(), algorithm))
            .collect();
        Self {
            algorithms,
            default: HashAlgorithm::Sha256,
        }
    }

    /// Registry whose default algorithm is looked up by name
    pub fn with_default(name: &str) -> Result<Self> {
        let mut registry = Self::new();
        registry.default = registry.lookup(name)?;
        Ok(registry)
    }

    pub fn lookup(&self, name: &str) -> Result<HashAlgorithm> {
        self.algorithms
            .get(name)
            .copied()
            .ok_or_else(|| Error::unknown_hash_algorithm(name, &self.names()))
    }

    pub fn default_algorithm(&self) -> HashAlgorithm {
        self.default
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.algorithms.keys().copied().collect()
    }

    pub fn hasher(&self) -> Hasher {
        Hasher::new(self.default)
    }
}

impl Default for HasherRegistry {
    fn default() -> Self {
        Self::with_default(DEFAULT_HASH_ALGORITHM).unwrap_or_else(|_| Self::new())
    }
}
