//! Up-to-date checks and execution recording for stamp
//!
//! A [`Task`] declares where its inputs and outputs live. The
//! [`ExecutionEngine`] snapshots those locations, compares them with the
//! task's previous execution and, once the task has run successfully,
//! records the new state:
//!
//! ```text
//! declared locations -> snapshot trees -> fingerprints -> overlap detection
//!     -> cache key + caching state -> compare with history -> up to date?
//!     -> (task runs) -> commit_success() -> history
//! ```

pub mod definition;
pub mod engine;
pub mod execution;

pub use definition::{InputFileProperty, Task, TaskDefinition};
pub use engine::ExecutionEngine;
pub use execution::{TaskExecution, UpToDateResult};
