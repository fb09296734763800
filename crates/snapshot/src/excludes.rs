//! Exclude patterns applied during snapshot walks
//!
//! Patterns use the Ant style the default list is written in. A leading
//! `**/` is dropped since every pattern applies at any depth. `name/**`
//! excludes directories called `name` together with their contents; any
//! other pattern is matched against file names, with `*` and `?` wildcards
//! supported through `globset`.

use globset::{Glob, GlobSet, GlobSetBuilder};
use stamp_core::{Error, Result, DEFAULT_EXCLUDES};
use stamp_utils::{canonical_set_key, MemoCache};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Compiled set of exclude patterns
#[derive(Debug, Clone)]
pub struct ExcludeSpec {
    patterns: Vec<String>,
    dir_names: BTreeSet<String>,
    file_names: BTreeSet<String>,
    file_globs: GlobSet,
}

impl ExcludeSpec {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = canonical_set_key(patterns.into_iter().map(Into::into));
        let mut dir_names = BTreeSet::new();
        let mut file_names = BTreeSet::new();
        let mut globs = GlobSetBuilder::new();

        for pattern in &patterns {
            let mut trimmed = pattern.as_str();
            while let Some(rest) = trimmed.strip_prefix("**/") {
                trimmed = rest;
            }
            if let Some(dir) = trimmed.strip_suffix("/**") {
                dir_names.insert(dir.to_string());
            } else if trimmed.contains(['*', '?']) {
                let glob = Glob::new(trimmed).map_err(|e| {
                    Error::configuration(format!("invalid exclude pattern '{pattern}': {e}"))
                })?;
                globs.add(glob);
            } else {
                file_names.insert(trimmed.to_string());
            }
        }

        let file_globs = globs
            .build()
            .map_err(|e| Error::configuration(format!("failed to build exclude patterns: {e}")))?;

        Ok(Self {
            patterns,
            dir_names,
            file_names,
            file_globs,
        })
    }

    /// Spec that excludes nothing
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            dir_names: BTreeSet::new(),
            file_names: BTreeSet::new(),
            file_globs: GlobSet::empty(),
        }
    }

    /// The built-in default excludes
    pub fn defaults() -> Result<Self> {
        Self::new(DEFAULT_EXCLUDES.iter().copied())
    }

    /// Sorted, de-duplicated source patterns
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn excludes_dir(&self, name: &str) -> bool {
        self.dir_names.contains(name)
    }

    pub fn excludes_file(&self, name: &str) -> bool {
        self.file_names.contains(name) || self.file_globs.is_match(name)
    }
}

/// Memoized merges of exclude pattern sets
///
/// Keys are the sorted union of the merged sets, so merge order does not
/// matter and each distinct union is compiled once.
#[derive(Debug, Default)]
pub struct ExcludeRuleCache {
    merged: MemoCache<Vec<String>, Arc<ExcludeSpec>>,
}

impl ExcludeRuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled spec for the union of `left` and `right`
    pub fn merge(&self, left: &[String], right: &[String]) -> Result<Arc<ExcludeSpec>> {
        let key = canonical_set_key(left.iter().chain(right).cloned());
        self.merged.get_or_try_insert_with(key, |patterns| {
            debug!(patterns = patterns.len(), "compiling merged exclude rules");
            ExcludeSpec::new(patterns.iter().cloned()).map(Arc::new)
        })
    }

    /// Number of distinct merged rule sets compiled so far
    pub fn len(&self) -> usize {
        self.merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_excludes() {
        let spec = ExcludeSpec::defaults().unwrap();
        assert!(spec.excludes_dir(".git"));
        assert!(spec.excludes_dir(".svn"));
        assert!(spec.excludes_dir("CVS"));
        assert!(!spec.excludes_dir("src"));

        assert!(spec.excludes_file(".DS_Store"));
        assert!(spec.excludes_file(".gitignore"));
        assert!(spec.excludes_file("Foo.java~"));
        assert!(spec.excludes_file("#Foo.java#"));
        assert!(spec.excludes_file(".#Foo.java"));
        assert!(spec.excludes_file("._Foo.java"));
        assert!(spec.excludes_file("%temp%"));
        assert!(!spec.excludes_file("Foo.java"));
        assert!(!spec.excludes_file("~Foo.java"));
    }

    #[test]
    fn test_dir_patterns_do_not_apply_to_files() {
        let spec = ExcludeSpec::new(["**/build/**"]).unwrap();
        assert!(spec.excludes_dir("build"));
        assert!(!spec.excludes_file("build"));
    }

    #[test]
    fn test_empty_spec() {
        let spec = ExcludeSpec::empty();
        assert!(!spec.excludes_dir(".git"));
        assert!(!spec.excludes_file(".DS_Store"));
        assert!(spec.patterns().is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ExcludeSpec::new(["**/[unclosed*"]).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_merge_is_memoized_and_order_independent() {
        let cache = ExcludeRuleCache::new();
        let defaults: Vec<String> = vec!["**/.git/**".into(), "**/*~".into()];
        let extra: Vec<String> = vec!["**/*.tmp".into(), "**/.git/**".into()];

        let first = cache.merge(&defaults, &extra).unwrap();
        let second = cache.merge(&extra, &defaults).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(first.patterns(), &["**/*.tmp", "**/*~", "**/.git/**"]);
        assert!(first.excludes_file("scratch.tmp"));
        assert!(first.excludes_dir(".git"));
    }
}
