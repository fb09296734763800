use std::path::PathBuf;

/// Result type alias for stamp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for stamp operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A declared path cannot be normalized under the requested strategy
    #[error("path '{path}' cannot be normalized: {message}")]
    InvalidPath { path: PathBuf, message: String },

    /// Filesystem failure while walking or hashing a snapshot root
    #[error("failed to {operation} '{path}' while snapshotting: {source}")]
    SnapshotIo {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// A persisted execution record could not be read back
    #[error("execution history for '{task}' is corrupt: {message}")]
    HistoryCorruption { task: String, message: String },

    /// A hash algorithm name that the registry does not know
    #[error("unknown hash algorithm '{name}' (known: {known})")]
    UnknownHashAlgorithm { name: String, known: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// File system operations outside of snapshotting
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create an invalid path error
    #[must_use]
    pub fn invalid_path(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a snapshot I/O error with context
    #[must_use]
    pub fn snapshot_io(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::SnapshotIo {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a history corruption error
    #[must_use]
    pub fn history_corruption(task: impl Into<String>, message: impl Into<String>) -> Self {
        Error::HistoryCorruption {
            task: task.into(),
            message: message.into(),
        }
    }

    /// Create an unknown hash algorithm error
    #[must_use]
    pub fn unknown_hash_algorithm(name: impl Into<String>, known: &[&str]) -> Self {
        Error::UnknownHashAlgorithm {
            name: name.into(),
            known: known.join(", "),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a JSON error with a custom message
    #[must_use]
    pub fn json(message: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Json {
            message: message.into(),
            source,
        }
    }

    /// Whether this error must abort the build instead of degrading caching.
    ///
    /// Only configuration-time problems are fatal; snapshot I/O failures are
    /// recovered into a disabled caching state by the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidPath { .. }
                | Error::UnknownHashAlgorithm { .. }
                | Error::Configuration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_path_display() {
        let err = Error::invalid_path("/outside/file.txt", "not nested under root '/root'");
        assert_eq!(
            err.to_string(),
            "path '/outside/file.txt' cannot be normalized: not nested under root '/root'"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_snapshot_io_is_recoverable() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::snapshot_io("/tmp/a.txt", "read file", io);
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("failed to read file '/tmp/a.txt'"));
    }

    #[test]
    fn test_unknown_hash_algorithm_lists_known() {
        let err = Error::unknown_hash_algorithm("md5", &["sha256", "xxh3-128"]);
        assert_eq!(
            err.to_string(),
            "unknown hash algorithm 'md5' (known: sha256, xxh3-128)"
        );
    }
}
