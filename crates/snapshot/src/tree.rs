//! Ordered snapshot trees
//!
//! A [`SnapshotTree`] holds one [`SnapshotNode`] per entry beneath a declared
//! root. Children are kept sorted by file name so every traversal, and every
//! hash derived from one, is independent of the order the OS listed them in.

use crate::content::{ContentSnapshot, FileType};
use stamp_core::HashAlgorithm;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

/// One entry of a snapshot tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNode {
    path: PathBuf,
    name: String,
    content: ContentSnapshot,
    via_symlink: bool,
    children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn regular_file(path: impl Into<PathBuf>, content: ContentSnapshot) -> Self {
        Self::leaf(path.into(), content)
    }

    /// Directory node; `children` are sorted by name
    pub fn directory(path: impl Into<PathBuf>, mut children: Vec<SnapshotNode>) -> Self {
        children.sort_by(|a, b| a.name.cmp(&b.name));
        let mut node = Self::leaf(path.into(), ContentSnapshot::Directory);
        node.children = children;
        node
    }

    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::leaf(path.into(), ContentSnapshot::Missing)
    }

    fn leaf(path: PathBuf, content: ContentSnapshot) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            content,
            via_symlink: false,
            children: Vec::new(),
        }
    }

    /// Mark this entry as reached through a symbolic link
    pub fn via_symlink(mut self, via_symlink: bool) -> Self {
        self.via_symlink = via_symlink;
        self
    }

    /// Absolute path of the entry itself (the link's path for symlinks)
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &ContentSnapshot {
        &self.content
    }

    pub fn file_type(&self) -> FileType {
        self.content.file_type()
    }

    pub fn is_symlink(&self) -> bool {
        self.via_symlink
    }

    pub fn children(&self) -> &[SnapshotNode] {
        &self.children
    }
}

/// Result of visiting one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitAction {
    /// Descend into the node's children
    Continue,
    /// Do not visit the node's children, carry on with its siblings
    SkipSubtree,
    /// Stop the whole traversal
    Terminate,
}

/// Depth-first visitor over a snapshot tree
pub trait SnapshotVisitor {
    fn visit(&mut self, node: &SnapshotNode, depth: usize) -> VisitAction;
}

impl<F> SnapshotVisitor for F
where
    F: FnMut(&SnapshotNode, usize) -> VisitAction,
{
    fn visit(&mut self, node: &SnapshotNode, depth: usize) -> VisitAction {
        self(node, depth)
    }
}

/// Snapshot of everything beneath one root location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotTree {
    root: SnapshotNode,
    algorithm: HashAlgorithm,
}

impl SnapshotTree {
    pub fn new(root: SnapshotNode, algorithm: HashAlgorithm) -> Self {
        Self { root, algorithm }
    }

    pub fn root(&self) -> &SnapshotNode {
        &self.root
    }

    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Algorithm the regular-file hashes were computed with
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Whether the root location did not exist
    pub fn is_missing(&self) -> bool {
        self.root.file_type() == FileType::Missing
    }

    /// Visit nodes depth-first in name order.
    ///
    /// Returns `false` when the visitor terminated the walk early.
    pub fn accept<V: SnapshotVisitor + ?Sized>(&self, visitor: &mut V) -> bool {
        walk(&self.root, 0, visitor).is_continue()
    }

    /// All nodes in depth-first pre-order, root first
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            stack: vec![&self.root],
        }
    }

    /// Number of nodes including the root
    pub fn entry_count(&self) -> usize {
        self.entries().count()
    }
}

fn walk<V: SnapshotVisitor + ?Sized>(
    node: &SnapshotNode,
    depth: usize,
    visitor: &mut V,
) -> ControlFlow<()> {
    match visitor.visit(node, depth) {
        VisitAction::Terminate => return ControlFlow::Break(()),
        VisitAction::SkipSubtree => return ControlFlow::Continue(()),
        VisitAction::Continue => {}
    }
    for child in &node.children {
        if walk(child, depth + 1, visitor).is_break() {
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

/// Pre-order iterator over a tree's nodes
pub struct Entries<'a> {
    stack: Vec<&'a SnapshotNode>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = &'a SnapshotNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
