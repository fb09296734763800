use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for stamp
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CONFIG_HOME/stamp or fallback
    pub fn config_dir() -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".config"))
                    .unwrap_or_else(|| PathBuf::from(".config"))
            })
            .join("stamp")
    }

    /// Get XDG_STATE_HOME/stamp or fallback
    pub fn state_dir() -> PathBuf {
        env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".local/state"))
                    .unwrap_or_else(|| PathBuf::from(".local/state"))
            })
            .join("stamp")
    }

    /// Default configuration file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Default execution history directory
    pub fn history_dir() -> PathBuf {
        Self::state_dir().join(stamp_core::HISTORY_DIR_NAME)
    }
}
