#![allow(dead_code)]

use stamp_cache::Cacheability;
use stamp_config::EngineConfig;
use stamp_core::{HashAlgorithm, ImplementationIdentity, NormalizationStrategy, TaskIdentity};
use stamp_history::{ExecutionHistoryStore, InMemoryHistoryStore};
use stamp_task::{ExecutionEngine, InputFileProperty, TaskDefinition};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A project directory with a `src/Foo.java` source file
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().unwrap(),
        };
        project.write("src/Foo.java", "class Foo {}");
        project
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn append(&self, relative: &str, content: &str) {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(self.path(relative))
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    /// Pretend the compiler ran
    pub fn compile(&self) {
        self.write("build/classes/Foo.class", "compiled Foo");
    }

    /// `compileJava` reading `src` relatively and writing `build/classes`
    pub fn compile_java(&self) -> TaskDefinition {
        let mut inputs = BTreeMap::new();
        inputs.insert(
            "sources".to_string(),
            InputFileProperty::new(self.path("src"), NormalizationStrategy::Relative),
        );
        let mut outputs = BTreeMap::new();
        outputs.insert("classes".to_string(), self.path("build/classes"));

        TaskDefinition {
            identity: TaskIdentity::new(":compileJava"),
            implementation: implementation("JavaCompile", "v1"),
            actions: Vec::new(),
            inputs,
            input_values: BTreeMap::new(),
            outputs,
            cacheability: Cacheability::Cacheable,
        }
    }
}

pub fn implementation(type_name: &str, version: &str) -> ImplementationIdentity {
    ImplementationIdentity::new(type_name, HashAlgorithm::Sha256.hash_bytes(version.as_bytes()))
}

pub fn config(history_dir: &Path) -> EngineConfig {
    EngineConfig::builder()
        .history_dir(history_dir)
        .build()
        .unwrap()
}

pub fn engine_with(config: EngineConfig, history: Arc<dyn ExecutionHistoryStore>) -> ExecutionEngine {
    ExecutionEngine::new(config, history).unwrap()
}

/// Engine over a fresh in-memory history
pub fn engine(project: &Project) -> ExecutionEngine {
    engine_with(
        config(&project.path("history")),
        Arc::new(InMemoryHistoryStore::new()),
    )
}
