//! Filesystem walk producing [`SnapshotTree`]s

use crate::content::ContentSnapshot;
use crate::excludes::ExcludeSpec;
use crate::hashing::FileHasher;
use crate::tree::{SnapshotNode, SnapshotTree};
use stamp_core::{Error, HashAlgorithm, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Walks a root location once and records the content of every entry.
///
/// Symbolic links are followed for their content but keep their own path.
/// A link whose target does not exist becomes `Missing`, and a directory
/// link pointing back at a directory already on the walk stack becomes an
/// empty `Directory`.
#[derive(Debug, Clone)]
pub struct DirectorySnapshotter {
    hasher: FileHasher,
    excludes: Arc<ExcludeSpec>,
}

impl DirectorySnapshotter {
    pub fn new(algorithm: HashAlgorithm, excludes: Arc<ExcludeSpec>) -> Self {
        Self {
            hasher: FileHasher::new(algorithm),
            excludes,
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.hasher.algorithm()
    }

    /// Snapshot `root` and everything beneath it.
    ///
    /// The root itself is never excluded. A root that does not exist yields a
    /// tree with a single `Missing` node.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn snapshot(&self, root: &Path) -> Result<SnapshotTree> {
        let mut ancestors = Vec::new();
        let node = self.snapshot_entry(root, &mut ancestors)?;
        let tree = SnapshotTree::new(node, self.algorithm());
        debug!(
            entries = tree.entry_count(),
            root_type = %tree.root().file_type(),
            "snapshot complete"
        );
        Ok(tree)
    }

    fn snapshot_entry(&self, path: &Path, ancestors: &mut Vec<PathBuf>) -> Result<SnapshotNode> {
        let link_metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SnapshotNode::missing(path)),
            Err(e) => return Err(Error::snapshot_io(path, "read metadata", e)),
        };

        let via_symlink = link_metadata.file_type().is_symlink();
        let metadata = if via_symlink {
            match fs::metadata(path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    trace!(path = %path.display(), error = %e, "broken symlink");
                    return Ok(SnapshotNode::missing(path).via_symlink(true));
                }
            }
        } else {
            link_metadata
        };

        if metadata.is_file() {
            let hash = self.hasher.hash_file(path)?;
            Ok(
                SnapshotNode::regular_file(path, ContentSnapshot::RegularFile(hash))
                    .via_symlink(via_symlink),
            )
        } else if metadata.is_dir() {
            self.snapshot_directory(path, via_symlink, ancestors)
        } else {
            // Sockets, pipes and devices have no content to compare
            Ok(SnapshotNode::missing(path).via_symlink(via_symlink))
        }
    }

    fn snapshot_directory(
        &self,
        path: &Path,
        via_symlink: bool,
        ancestors: &mut Vec<PathBuf>,
    ) -> Result<SnapshotNode> {
        let canonical =
            fs::canonicalize(path).map_err(|e| Error::snapshot_io(path, "canonicalize", e))?;

        if ancestors.contains(&canonical) {
            debug!(path = %path.display(), target = %canonical.display(), "symlink cycle");
            return Ok(SnapshotNode::directory(path, Vec::new()).via_symlink(via_symlink));
        }

        ancestors.push(canonical);
        let children = self.snapshot_children(path, ancestors);
        ancestors.pop();

        Ok(SnapshotNode::directory(path, children?).via_symlink(via_symlink))
    }

    fn snapshot_children(
        &self,
        dir: &Path,
        ancestors: &mut Vec<PathBuf>,
    ) -> Result<Vec<SnapshotNode>> {
        let entries =
            fs::read_dir(dir).map_err(|e| Error::snapshot_io(dir, "read directory", e))?;

        let mut listed = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::snapshot_io(dir, "read directory entry", e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| Error::snapshot_io(&path, "read file type", e))?;
            // Links are matched as whatever they point at; broken links as files
            let is_dir = if file_type.is_symlink() {
                fs::metadata(&path).is_ok_and(|metadata| metadata.is_dir())
            } else {
                file_type.is_dir()
            };
            listed.push((name, is_dir, path));
        }
        listed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut children = Vec::with_capacity(listed.len());
        for (name, is_dir, path) in listed {
            let excluded = if is_dir {
                self.excludes.excludes_dir(&name)
            } else {
                self.excludes.excludes_file(&name)
            };
            if excluded {
                trace!(path = %path.display(), "excluded");
                continue;
            }
            children.push(self.snapshot_entry(&path, ancestors)?);
        }
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FileType;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn snapshotter() -> DirectorySnapshotter {
        DirectorySnapshotter::new(HashAlgorithm::Sha256, Arc::new(ExcludeSpec::defaults().unwrap()))
    }

    fn relative_names(tree: &SnapshotTree) -> Vec<String> {
        tree.entries()
            .map(|node| {
                node.path()
                    .strip_prefix(tree.root_path())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn test_snapshot_directory_tree() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("main/java")).unwrap();
        fs::write(root.join("main/java/Foo.java"), "class Foo {}").unwrap();
        fs::write(root.join("b.txt"), "b").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();

        let tree = snapshotter().snapshot(root).unwrap();

        assert_eq!(tree.root().file_type(), FileType::Directory);
        assert_eq!(
            relative_names(&tree),
            vec!["", "a.txt", "b.txt", "main", "main/java", "main/java/Foo.java"]
        );
        let foo = tree
            .entries()
            .find(|node| node.name() == "Foo.java")
            .unwrap();
        assert_eq!(
            foo.content(),
            &ContentSnapshot::RegularFile(HashAlgorithm::Sha256.hash_bytes(b"class Foo {}"))
        );
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let tree = snapshotter().snapshot(&temp.path().join("absent")).unwrap();
        assert!(tree.is_missing());
        assert_eq!(tree.entry_count(), 1);
    }

    #[test]
    fn test_single_file_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("input.txt");
        fs::write(&file, "x").unwrap();
        let tree = snapshotter().snapshot(&file).unwrap();
        assert_eq!(tree.root().file_type(), FileType::RegularFile);
        assert_eq!(tree.root().path(), file.as_path());
    }

    #[test]
    fn test_default_excludes_are_skipped() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join(".git/HEAD"), "ref").unwrap();
        fs::write(root.join(".DS_Store"), "junk").unwrap();
        fs::write(root.join("Foo.java~"), "backup").unwrap();
        fs::write(root.join("Foo.java"), "class Foo {}").unwrap();

        let tree = snapshotter().snapshot(root).unwrap();
        assert_eq!(relative_names(&tree), vec!["", "Foo.java"]);
    }

    #[test]
    fn test_mtime_does_not_change_snapshot() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Foo.java");
        fs::write(&file, "class Foo {}").unwrap();

        let before = snapshotter().snapshot(temp.path()).unwrap();
        let later = SystemTime::now() + Duration::from_secs(3600);
        filetime::set_file_mtime(&file, filetime::FileTime::from_system_time(later)).unwrap();
        let after = snapshotter().snapshot(temp.path()).unwrap();

        assert_eq!(before, after);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_file_keeps_link_path() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        fs::create_dir(&root).unwrap();
        let target = temp.path().join("target.txt");
        fs::write(&target, "linked").unwrap();
        std::os::unix::fs::symlink(&target, root.join("link.txt")).unwrap();

        let tree = snapshotter().snapshot(&root).unwrap();
        let link = tree.entries().find(|node| node.name() == "link.txt").unwrap();
        assert!(link.is_symlink());
        assert_eq!(link.path(), root.join("link.txt").as_path());
        assert_eq!(
            link.content(),
            &ContentSnapshot::RegularFile(HashAlgorithm::Sha256.hash_bytes(b"linked"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_is_missing() {
        let temp = TempDir::new().unwrap();
        std::os::unix::fs::symlink(temp.path().join("nowhere"), temp.path().join("dangling"))
            .unwrap();

        let tree = snapshotter().snapshot(temp.path()).unwrap();
        let dangling = tree.entries().find(|node| node.name() == "dangling").unwrap();
        assert_eq!(dangling.file_type(), FileType::Missing);
        assert!(dangling.is_symlink());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/file.txt"), "x").unwrap();
        std::os::unix::fs::symlink(&root, root.join("sub/loop")).unwrap();

        let tree = snapshotter().snapshot(&root).unwrap();
        let looped = tree.entries().find(|node| node.name() == "loop").unwrap();
        assert_eq!(looped.file_type(), FileType::Directory);
        assert!(looped.children().is_empty());
        assert_eq!(relative_names(&tree), vec!["", "sub", "sub/file.txt", "sub/loop"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_matches_directory_excludes() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("Foo.java"), "class Foo {}").unwrap();
        let repository = temp.path().join("repository");
        fs::create_dir(&repository).unwrap();
        fs::write(repository.join("HEAD"), "ref: refs/heads/main").unwrap();
        std::os::unix::fs::symlink(&repository, root.join(".git")).unwrap();

        let tree = snapshotter().snapshot(&root).unwrap();
        assert_eq!(relative_names(&tree), vec!["", "Foo.java"]);
    }
}
