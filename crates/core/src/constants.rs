/// Constants used throughout the stamp workspace

/// Layout version of content hashes, fingerprints and cache keys.
///
/// Bump whenever the bytes fed into a hash change. Persisted history written
/// under another version is treated as absent.
pub const FINGERPRINT_FORMAT_VERSION: u32 = 1;

// Hashing
pub const DEFAULT_HASH_ALGORITHM: &str = "sha256";

// Up-to-date reporting
pub const DEFAULT_MAX_OUT_OF_DATE_MESSAGES: usize = 3;

// History store layout
pub const HISTORY_DIR_NAME: &str = "history";
pub const HISTORY_FILE_EXTENSION: &str = "json";

// Environment variable names
pub const STAMP_CONFIG_VAR: &str = "STAMP_CONFIG";
pub const STAMP_BUILD_CACHE_ENABLED_VAR: &str = "STAMP_BUILD_CACHE_ENABLED";
pub const STAMP_HASH_ALGORITHM_VAR: &str = "STAMP_HASH_ALGORITHM";
pub const STAMP_HISTORY_DIR_VAR: &str = "STAMP_HISTORY_DIR";
pub const STAMP_MAX_OUT_OF_DATE_MESSAGES_VAR: &str = "STAMP_MAX_OUT_OF_DATE_MESSAGES";
pub const STAMP_LOG_VAR: &str = "STAMP_LOG";

/// Entries skipped by every filesystem walk unless the configuration overrides them
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/%*%",
    "**/.git/**",
    "**/.gitattributes",
    "**/.gitignore",
    "**/.gitmodules",
    "**/.hg/**",
    "**/.hgignore",
    "**/.hgsub",
    "**/.hgsubstate",
    "**/.hgtags",
    "**/.bzr/**",
    "**/.bzrignore",
    "**/CVS/**",
    "**/.cvsignore",
    "**/SCCS/**",
    "**/vssver.scc",
    "**/.svn/**",
    "**/.DS_Store",
    "**/._*",
    "**/#*#",
    "**/.#*",
    "**/*~",
];
