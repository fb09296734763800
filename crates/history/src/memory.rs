use crate::{ExecutionHistoryStore, PreviousExecutionRecord};
use dashmap::DashMap;
use stamp_core::{Result, TaskIdentity};
use std::sync::Arc;

/// History kept for the lifetime of the process
///
/// Each task's record sits behind an `Arc` that is swapped whole on store,
/// and the map is sharded so unrelated tasks do not contend.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    records: DashMap<TaskIdentity, Arc<PreviousExecutionRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ExecutionHistoryStore for InMemoryHistoryStore {
    fn load(&self, task: &TaskIdentity) -> Option<PreviousExecutionRecord> {
        self.records
            .get(task)
            .map(|record| PreviousExecutionRecord::clone(&record))
    }

    fn store(&self, task: &TaskIdentity, record: PreviousExecutionRecord) -> Result<()> {
        self.records.insert(task.clone(), Arc::new(record));
        Ok(())
    }

    fn remove(&self, task: &TaskIdentity) -> Result<()> {
        self.records.remove(task);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;

    #[test]
    fn test_store_load_remove() {
        let store = InMemoryHistoryStore::new();
        let task = TaskIdentity::new(":compileJava");
        assert!(store.load(&task).is_none());

        store.store(&task, record("v1")).unwrap();
        assert_eq!(store.load(&task), Some(record("v1")));

        store.store(&task, record("v2")).unwrap();
        assert_eq!(store.load(&task), Some(record("v2")));
        assert_eq!(store.len(), 1);

        store.remove(&task).unwrap();
        assert!(store.load(&task).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_tasks() {
        let store = InMemoryHistoryStore::new();
        std::thread::scope(|scope| {
            for i in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    let task = TaskIdentity::new(format!(":task{i}"));
                    for round in 0..20 {
                        store.store(&task, record(&format!("{i}-{round}"))).unwrap();
                        let loaded = store.load(&task).unwrap();
                        assert_eq!(loaded, record(&format!("{i}-{round}")));
                    }
                });
            }
        });
        assert_eq!(store.len(), 8);
    }
}
