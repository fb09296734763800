//! Core domain types, hashing primitives and errors for the `stamp` engine.
//!
//! Everything above this crate (snapshots, fingerprints, the history store and
//! the cache key calculator) is built from the same small set of values:
//!
//! - **`errors`**: the `Error` enum and `Result` alias shared by every crate.
//! - **`hash`**: `HashCode`, the `HashAlgorithm`s the engine supports, the
//!   length-prefixed `Hasher` and the explicit `HasherRegistry`.
//! - **`path`**: `NormalizedPath` and the `PathNormalizer` that turns absolute
//!   paths into comparison keys.
//! - **`identity`**: task, implementation and cache key identities.
//! - **`constants`**: format version, default excludes and environment names.

pub mod constants;
pub mod errors;
pub mod hash;
pub mod identity;
pub mod path;

pub use self::{
    constants::*,
    errors::{Error, Result},
    hash::{HashAlgorithm, HashCode, Hasher, HasherRegistry},
    identity::{BuildCacheKey, ImplementationIdentity, TaskIdentity},
    path::{NormalizationStrategy, NormalizedPath, PathNormalizer},
};
