//! Engine configuration values
//!
//! `EngineConfig` is immutable once built and cheap to clone, so a single
//! instance can be handed to every engine that shares a history directory.

use serde::{Deserialize, Serialize};
use stamp_core::{
    HashAlgorithm, HasherRegistry, Result, DEFAULT_EXCLUDES, DEFAULT_HASH_ALGORITHM,
    DEFAULT_MAX_OUT_OF_DATE_MESSAGES,
};
use stamp_utils::XdgPaths;
use std::path::PathBuf;

/// Where the effective value of a setting came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Built-in default
    #[default]
    Default,
    /// A JSON configuration file
    ConfigFile(PathBuf),
    /// A `STAMP_*` environment variable
    EnvironmentVariable(String),
    /// An explicit override, usually a command line flag
    CommandLine,
}

/// Runtime configuration of the fingerprinting engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Whether build cache keys may be used to reuse outputs
    pub build_cache_enabled: bool,

    /// Name of the content hash algorithm, resolved through a [`HasherRegistry`]
    pub hash_algorithm: String,

    /// Directory holding one execution record per task
    pub history_dir: PathBuf,

    /// Patterns skipped by every snapshot walk
    pub default_excludes: Vec<String>,

    /// Upper bound on the out-of-date reasons reported per task
    pub max_out_of_date_messages: usize,

    /// Layer that last changed any setting
    #[serde(skip)]
    pub source: ConfigSource,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            build_cache_enabled: true,
            hash_algorithm: DEFAULT_HASH_ALGORITHM.to_string(),
            history_dir: XdgPaths::history_dir(),
            default_excludes: DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()).collect(),
            max_out_of_date_messages: DEFAULT_MAX_OUT_OF_DATE_MESSAGES,
            source: ConfigSource::Default,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Registry whose default is the configured algorithm
    pub fn hasher_registry(&self) -> Result<HasherRegistry> {
        HasherRegistry::with_default(&self.hash_algorithm)
    }

    /// The configured algorithm, failing on names the registry does not know
    pub fn algorithm(&self) -> Result<HashAlgorithm> {
        Ok(self.hasher_registry()?.default_algorithm())
    }
}

/// Partial configuration as read from a JSON file
///
/// Every field is optional; absent fields keep the value of the layer below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfigFile {
    pub build_cache_enabled: Option<bool>,
    pub hash_algorithm: Option<String>,
    pub history_dir: Option<PathBuf>,
    pub default_excludes: Option<Vec<String>>,
    pub max_out_of_date_messages: Option<usize>,
}

impl EngineConfigFile {
    /// Apply the fields present in this file on top of `config`
    pub fn apply_to(self, config: &mut EngineConfig, source: ConfigSource) {
        let mut touched = false;
        if let Some(enabled) = self.build_cache_enabled {
            config.build_cache_enabled = enabled;
            touched = true;
        }
        if let Some(algorithm) = self.hash_algorithm {
            config.hash_algorithm = algorithm;
            touched = true;
        }
        if let Some(dir) = self.history_dir {
            config.history_dir = dir;
            touched = true;
        }
        if let Some(excludes) = self.default_excludes {
            config.default_excludes = excludes;
            touched = true;
        }
        if let Some(max) = self.max_out_of_date_messages {
            config.max_out_of_date_messages = max;
            touched = true;
        }
        if touched {
            config.source = source;
        }
    }
}

/// Builder for explicit overrides on top of a base configuration
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
    overrides: EngineConfigFile,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::from_config(EngineConfig::default())
    }

    /// Start from an already layered configuration
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            overrides: EngineConfigFile::default(),
        }
    }

    pub fn build_cache_enabled(mut self, enabled: bool) -> Self {
        self.overrides.build_cache_enabled = Some(enabled);
        self
    }

    pub fn hash_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.overrides.hash_algorithm = Some(algorithm.into());
        self
    }

    pub fn history_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.overrides.history_dir = Some(dir.into());
        self
    }

    pub fn default_excludes<I, S>(mut self, excludes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides.default_excludes = Some(excludes.into_iter().map(Into::into).collect());
        self
    }

    pub fn max_out_of_date_messages(mut self, max: usize) -> Self {
        self.overrides.max_out_of_date_messages = Some(max);
        self
    }

    /// Apply the overrides and validate the result
    pub fn build(self) -> Result<EngineConfig> {
        let mut config = self.config;
        self.overrides.apply_to(&mut config, ConfigSource::CommandLine);
        validate(&config)?;
        Ok(config)
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject configurations the engine could not run with
pub fn validate(config: &EngineConfig) -> Result<()> {
    config.hasher_registry()?;
    if config.max_out_of_date_messages == 0 {
        return Err(stamp_core::Error::configuration(
            "max_out_of_date_messages must be at least 1",
        ));
    }
    Ok(())
}
