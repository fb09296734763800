//! Path normalization
//!
//! A [`NormalizedPath`] is the key under which a filesystem entry is compared
//! between two executions. Which parts of the absolute path survive depends on
//! the [`NormalizationStrategy`] declared for the property.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Comparison key derived from an absolute path.
///
/// Ordering is the byte order of the UTF-8 string, so sorted iteration is the
/// same on every platform and in every process.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPath {
    path: String,
}

impl NormalizedPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Absolute normalization, forward slashes on every platform
    pub fn absolute(path: &Path) -> Self {
        Self::new(to_slash(path))
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<&str> for NormalizedPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// How much of an absolute path takes part in comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationStrategy {
    /// The full path
    #[default]
    Absolute,
    /// The path below the declared root
    Relative,
    /// The last path segment only
    NameOnly,
    /// A single constant key for everything under the root
    Ignored,
}

impl NormalizationStrategy {
    pub fn name(self) -> &'static str {
        match self {
            NormalizationStrategy::Absolute => "absolute",
            NormalizationStrategy::Relative => "relative",
            NormalizationStrategy::NameOnly => "name_only",
            NormalizationStrategy::Ignored => "ignored",
        }
    }
}

impl fmt::Display for NormalizationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NormalizationStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "absolute" => Ok(NormalizationStrategy::Absolute),
            "relative" => Ok(NormalizationStrategy::Relative),
            "name_only" | "name-only" => Ok(NormalizationStrategy::NameOnly),
            "ignored" | "none" => Ok(NormalizationStrategy::Ignored),
            other => Err(Error::configuration(format!(
                "unknown normalization strategy '{other}'"
            ))),
        }
    }
}

/// Reduces absolute paths below `root` to [`NormalizedPath`]s
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNormalizer {
    strategy: NormalizationStrategy,
    root: PathBuf,
}

impl PathNormalizer {
    pub fn new(strategy: NormalizationStrategy, root: impl Into<PathBuf>) -> Self {
        Self {
            strategy,
            root: root.into(),
        }
    }

    pub fn strategy(&self) -> NormalizationStrategy {
        self.strategy
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalize `path` under this normalizer's strategy.
    ///
    /// `Relative` and `Ignored` require `path` to be the root or nested under
    /// it. The root itself normalizes to the empty string under `Relative`.
    pub fn normalize(&self, path: &Path) -> Result<NormalizedPath> {
        match self.strategy {
            NormalizationStrategy::Absolute => Ok(NormalizedPath::absolute(path)),
            NormalizationStrategy::Relative => {
                let relative = self.relative_to_root(path)?;
                Ok(NormalizedPath::new(join_segments(relative)))
            }
            NormalizationStrategy::NameOnly => Ok(match path.file_name() {
                Some(name) => NormalizedPath::new(name.to_string_lossy()),
                None => NormalizedPath::absolute(path),
            }),
            NormalizationStrategy::Ignored => {
                self.relative_to_root(path)?;
                Ok(NormalizedPath::new(""))
            }
        }
    }

    fn relative_to_root<'p>(&self, path: &'p Path) -> Result<&'p Path> {
        path.strip_prefix(&self.root).map_err(|_| {
            Error::invalid_path(
                path,
                format!("not nested under root '{}'", self.root.display()),
            )
        })
    }
}

/// Render a path with `/` separators regardless of platform
pub fn to_slash(path: &Path) -> String {
    let rendered = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        rendered.into_owned()
    } else {
        rendered.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

fn join_segments(relative: &Path) -> String {
    let mut joined = String::new();
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            if !joined.is_empty() {
                joined.push('/');
            }
            joined.push_str(&segment.to_string_lossy());
        }
    }
    joined
}
