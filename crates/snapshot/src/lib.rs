//! Filesystem snapshots for the stamp engine
//!
//! A snapshot is the content identity of every entry beneath a declared
//! location, captured in one depth-first walk:
//!
//! - **`content`**: `ContentSnapshot` for a single entry and its `FileType` tag.
//! - **`hashing`**: streaming content hashes of regular files.
//! - **`tree`**: the ordered `SnapshotTree` and its visitor protocol.
//! - **`excludes`**: default exclude patterns and the memoized rule merge.
//! - **`snapshotter`**: the walk itself. This is the only blocking I/O in the engine.

pub mod content;
pub mod excludes;
pub mod hashing;
pub mod snapshotter;
pub mod tree;

pub use content::{ContentSnapshot, FileType};
pub use excludes::{ExcludeRuleCache, ExcludeSpec};
pub use hashing::FileHasher;
pub use snapshotter::DirectorySnapshotter;
pub use tree::{SnapshotNode, SnapshotTree, SnapshotVisitor, VisitAction};
