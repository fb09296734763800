//! Printable results of CLI commands

use serde::Serialize;
use stamp_cache::CachingState;
use stamp_core::TaskIdentity;
use stamp_task::UpToDateResult;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub task: TaskIdentity,
    #[serde(flatten)]
    pub result: UpToDateResult,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.result.up_to_date {
            return writeln!(f, "{} is up to date", self.task);
        }
        writeln!(f, "{} is out of date:", self.task)?;
        for message in &self.result.out_of_date_messages {
            writeln!(f, "  - {message}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DisabledReason {
    pub category: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyReport {
    pub task: TaskIdentity,
    /// Absent when fingerprinting failed before a key could be computed
    pub cache_key: Option<String>,
    pub caching_enabled: bool,
    pub disabled_reasons: Vec<DisabledReason>,
}

impl KeyReport {
    pub fn new(task: TaskIdentity, state: &CachingState) -> Self {
        Self {
            task,
            cache_key: state.key().map(ToString::to_string),
            caching_enabled: state.is_enabled(),
            disabled_reasons: state
                .disabled_reasons()
                .iter()
                .map(|reason| DisabledReason {
                    category: reason.category.to_string(),
                    message: reason.message.clone(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for KeyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Task: {}", self.task)?;
        match &self.cache_key {
            Some(key) => writeln!(f, "Build cache key: {key}")?,
            None => writeln!(f, "Build cache key: not calculated")?,
        }
        if self.caching_enabled {
            return writeln!(f, "Caching: enabled");
        }
        writeln!(f, "Caching: disabled")?;
        for reason in &self.disabled_reasons {
            writeln!(f, "  - {}: {}", reason.category, reason.message)?;
        }
        Ok(())
    }
}
