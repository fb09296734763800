//! Configuration loader
//!
//! Resolves the layered [`EngineConfig`] at startup. Environment lookups go
//! through a closure so tests never touch the process environment.

use crate::config::{validate, ConfigSource, EngineConfig, EngineConfigFile};
use stamp_core::{
    Error, Result, STAMP_BUILD_CACHE_ENABLED_VAR, STAMP_CONFIG_VAR, STAMP_HASH_ALGORITHM_VAR,
    STAMP_HISTORY_DIR_VAR, STAMP_MAX_OUT_OF_DATE_MESSAGES_VAR,
};
use stamp_utils::XdgPaths;
use std::path::{Path, PathBuf};
use tracing::debug;

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Loads configuration from file and environment
pub struct ConfigLoader {
    /// Explicit config file; otherwise `STAMP_CONFIG`, then the XDG location
    config_file: Option<PathBuf>,
    env: EnvLookup,
}

impl ConfigLoader {
    /// Loader reading the real process environment
    pub fn new() -> Self {
        Self {
            config_file: None,
            env: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Use this config file instead of discovering one
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Replace the environment lookup
    pub fn env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    /// Resolve defaults, config file and environment into one configuration
    pub fn load(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::default();

        if let Some(path) = self.resolve_config_file() {
            if path.exists() {
                debug!(path = %path.display(), "loading config file");
                read_config_file(&path)?.apply_to(&mut config, ConfigSource::ConfigFile(path));
            } else if self.config_file.is_some() {
                return Err(Error::configuration(format!(
                    "config file '{}' does not exist",
                    path.display()
                )));
            }
        }

        self.apply_env(&mut config)?;
        validate(&config)?;
        Ok(config)
    }

    fn resolve_config_file(&self) -> Option<PathBuf> {
        self.config_file
            .clone()
            .or_else(|| (self.env)(STAMP_CONFIG_VAR).map(PathBuf::from))
            .or_else(|| Some(XdgPaths::config_file()))
    }

    fn apply_env(&self, config: &mut EngineConfig) -> Result<()> {
        if let Some(value) = (self.env)(STAMP_BUILD_CACHE_ENABLED_VAR) {
            config.build_cache_enabled = parse_bool(STAMP_BUILD_CACHE_ENABLED_VAR, &value)?;
            config.source = ConfigSource::EnvironmentVariable(STAMP_BUILD_CACHE_ENABLED_VAR.into());
        }
        if let Some(value) = (self.env)(STAMP_HASH_ALGORITHM_VAR) {
            config.hash_algorithm = value;
            config.source = ConfigSource::EnvironmentVariable(STAMP_HASH_ALGORITHM_VAR.into());
        }
        if let Some(value) = (self.env)(STAMP_HISTORY_DIR_VAR) {
            config.history_dir = PathBuf::from(value);
            config.source = ConfigSource::EnvironmentVariable(STAMP_HISTORY_DIR_VAR.into());
        }
        if let Some(value) = (self.env)(STAMP_MAX_OUT_OF_DATE_MESSAGES_VAR) {
            config.max_out_of_date_messages = value.trim().parse().map_err(|_| {
                Error::configuration(format!(
                    "{STAMP_MAX_OUT_OF_DATE_MESSAGES_VAR} must be a positive integer, got '{value}'"
                ))
            })?;
            config.source =
                ConfigSource::EnvironmentVariable(STAMP_MAX_OUT_OF_DATE_MESSAGES_VAR.into());
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a partial configuration from a JSON file
pub fn read_config_file(path: &Path) -> Result<EngineConfigFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::file_system(path, "read config file", e))?;
    serde_json::from_str(&content).map_err(|e| {
        Error::json(format!("invalid config file '{}'", path.display()), e)
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::configuration(format!(
            "{name} must be a boolean, got '{value}'"
        ))),
    }
}
