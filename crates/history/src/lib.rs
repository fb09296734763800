//! Execution history for the stamp engine
//!
//! The store keeps, per task, what the task looked like after its last
//! successful execution. It is the only writer of durable engine state.

pub mod file;
pub mod memory;
pub mod record;

pub use file::FileHistoryStore;
pub use memory::InMemoryHistoryStore;
pub use record::PreviousExecutionRecord;

use stamp_core::{Result, TaskIdentity};

/// Storage of previous execution records.
///
/// Implementations replace a task's record atomically: a concurrent `load`
/// sees either the old record or the new one, never a mix. Operations on
/// different tasks do not block each other.
pub trait ExecutionHistoryStore: Send + Sync {
    /// The record of the last successful execution, if any
    fn load(&self, task: &TaskIdentity) -> Option<PreviousExecutionRecord>;

    /// Replace the record of `task`
    fn store(&self, task: &TaskIdentity, record: PreviousExecutionRecord) -> Result<()>;

    /// Forget everything about `task`
    fn remove(&self, task: &TaskIdentity) -> Result<()>;
}
