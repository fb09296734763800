//! Task declarations
//!
//! The engine only sees a task through the [`Task`] trait. [`TaskDefinition`]
//! is a serializable implementation used for JSON task manifests.

use serde::{Deserialize, Serialize};
use stamp_cache::Cacheability;
use stamp_core::{Error, ImplementationIdentity, NormalizationStrategy, Result, TaskIdentity};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A declared input location and how its paths are compared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFileProperty {
    pub root: PathBuf,
    #[serde(default)]
    pub strategy: NormalizationStrategy,
    /// Patterns skipped in addition to the configured default excludes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
}

impl InputFileProperty {
    pub fn new(root: impl Into<PathBuf>, strategy: NormalizationStrategy) -> Self {
        Self {
            root: root.into(),
            strategy,
            excludes: Vec::new(),
        }
    }

    pub fn with_excludes<I, S>(mut self, excludes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes = excludes.into_iter().map(Into::into).collect();
        self
    }
}

/// What the engine needs to know about a unit of work
pub trait Task {
    /// Stable, path-like name
    fn identity(&self) -> TaskIdentity;

    fn declared_input_properties(&self) -> BTreeMap<String, InputFileProperty>;

    /// Output roots by property name; outputs are always compared by absolute path
    fn declared_output_properties(&self) -> BTreeMap<String, PathBuf>;

    fn implementation_identity(&self) -> ImplementationIdentity;

    fn action_identities(&self) -> Vec<ImplementationIdentity> {
        Vec::new()
    }

    /// Non-file inputs, hashed through their canonical JSON form
    fn declared_input_values(&self) -> BTreeMap<String, serde_json::Value> {
        BTreeMap::new()
    }

    fn cacheability(&self) -> Cacheability {
        Cacheability::Cacheable
    }
}

/// Task declared in a JSON manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub identity: TaskIdentity,
    pub implementation: ImplementationIdentity,
    #[serde(default)]
    pub actions: Vec<ImplementationIdentity>,
    #[serde(default)]
    pub inputs: BTreeMap<String, InputFileProperty>,
    #[serde(default)]
    pub input_values: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub outputs: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub cacheability: Cacheability,
}

impl TaskDefinition {
    /// Load a manifest, resolving relative locations against its directory
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read task manifest", e))?;
        let definition: TaskDefinition = serde_json::from_str(&content)
            .map_err(|e| Error::json(format!("invalid task manifest '{}'", path.display()), e))?;

        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir()
                .map_err(|e| Error::file_system(path, "resolve current directory", e))?,
        };
        Ok(definition.resolve_paths(&base))
    }

    /// Make every relative input and output root absolute under `base`
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        for property in self.inputs.values_mut() {
            if property.root.is_relative() {
                property.root = base.join(&property.root);
            }
        }
        for root in self.outputs.values_mut() {
            if root.is_relative() {
                *root = base.join(&*root);
            }
        }
        self
    }
}

impl Task for TaskDefinition {
    fn identity(&self) -> TaskIdentity {
        self.identity.clone()
    }

    fn declared_input_properties(&self) -> BTreeMap<String, InputFileProperty> {
        self.inputs.clone()
    }

    fn declared_output_properties(&self) -> BTreeMap<String, PathBuf> {
        self.outputs.clone()
    }

    fn implementation_identity(&self) -> ImplementationIdentity {
        self.implementation.clone()
    }

    fn action_identities(&self) -> Vec<ImplementationIdentity> {
        self.actions.clone()
    }

    fn declared_input_values(&self) -> BTreeMap<String, serde_json::Value> {
        self.input_values.clone()
    }

    fn cacheability(&self) -> Cacheability {
        self.cacheability.clone()
    }
}
