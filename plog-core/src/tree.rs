//! In-memory file system tree used to address source documents.
//!
//! Nodes live in an arena owned by [`FileTree`]. Ownership is top-down only:
//! a directory lists its children by [`NodeId`], and every node keeps a
//! non-owning `parent` id that is written exactly once, when the node is
//! attached.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Extension (without the dot) of documents the pipeline renders.
pub const MARKDOWN_EXTENSION: &str = "md";

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Failed to scan {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Node '{0}' is not a directory")]
    NotADirectory(String),

    #[error("Directory '{parent}' already contains '{name}'")]
    DuplicateName { parent: String, name: String },

    #[error("Node '{0}' is already attached to a parent")]
    AlreadyAttached(String),

    #[error("Inconsistent tree structure: {0}")]
    Structural(String),
}

/// Order in which directory entries become children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrder {
    /// Children sorted by file name, reproducible across platforms.
    #[default]
    Sorted,
    /// Whatever order the platform's directory listing yields.
    Native,
}

/// Handle to a node inside a [`FileTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory { children: Vec<NodeId> },
}

#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    kind: NodeKind,
    detached: bool,
}

impl Node {
    fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            kind,
            detached: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// Children in insertion order; empty for files.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            NodeKind::File => &[],
        }
    }

    /// File extension without the leading dot. Directories have none.
    pub fn extension(&self) -> Option<&str> {
        if self.is_directory() {
            return None;
        }
        Path::new(&self.name).extension().and_then(|ext| ext.to_str())
    }

    /// Name with the extension stripped.
    pub fn stem(&self) -> &str {
        match self.extension() {
            Some(ext) => &self.name[..self.name.len() - ext.len() - 1],
            None => &self.name,
        }
    }

    pub fn is_markdown(&self) -> bool {
        self.extension() == Some(MARKDOWN_EXTENSION)
    }
}

/// Arena-backed tree of files and directories.
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl FileTree {
    /// A tree consisting of a single file.
    pub fn file(name: &str) -> Self {
        Self {
            nodes: vec![Node::new(name, NodeKind::File)],
            root: NodeId(0),
        }
    }

    /// A tree consisting of a single, empty directory.
    pub fn directory(name: &str) -> Self {
        Self {
            nodes: vec![Node::new(
                name,
                NodeKind::Directory {
                    children: Vec::new(),
                },
            )],
            root: NodeId(0),
        }
    }

    /// Scan `parent_dir/name` into a tree with sorted children.
    pub fn build(parent_dir: &Path, name: &str) -> Result<Self, TreeError> {
        Self::build_with_order(parent_dir, name, ScanOrder::Sorted)
    }

    /// Scan `parent_dir/name` into a tree.
    ///
    /// A regular file becomes a single-file tree; anything else is opened as
    /// a directory and scanned recursively. Children are attached in the
    /// order selected by `order`.
    pub fn build_with_order(
        parent_dir: &Path,
        name: &str,
        order: ScanOrder,
    ) -> Result<Self, TreeError> {
        let target = parent_dir.join(name);
        let mut walker = WalkDir::new(&target);
        if order == ScanOrder::Sorted {
            walker = walker.sort_by_file_name();
        }

        let mut tree: Option<FileTree> = None;
        // open_dirs[d] is the directory entered at walk depth d
        let mut open_dirs: Vec<NodeId> = Vec::new();

        for entry in walker {
            let entry = entry.map_err(|err| walk_error(&target, err))?;
            let is_dir = entry.file_type().is_dir();

            let Some(tree) = tree.as_mut() else {
                let root = if is_dir {
                    open_dirs.push(NodeId(0));
                    FileTree::directory(name)
                } else {
                    FileTree::file(name)
                };
                tree = Some(root);
                continue;
            };

            open_dirs.truncate(entry.depth());
            let parent = *open_dirs.last().ok_or_else(|| {
                TreeError::Structural(format!("{:?} has no scanned parent", entry.path()))
            })?;
            let child_name = entry.file_name().to_string_lossy();
            if is_dir {
                let id = tree.add_directory(parent, &child_name)?;
                open_dirs.push(id);
            } else {
                tree.add_file(parent, &child_name)?;
            }
        }

        let tree = tree.ok_or_else(|| TreeError::Io {
            path: target.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "nothing to scan"),
        })?;
        tracing::debug!("Scanned {:?}: {} nodes", target, tree.len());
        Ok(tree)
    }

    /// Scan an existing path, naming the root after its last component.
    ///
    /// Paths without a final name (`docs/..`, `.`) are canonicalized first.
    pub fn scan(path: &Path, order: ScanOrder) -> Result<Self, TreeError> {
        let canonical;
        let path = if path.file_name().is_none() {
            let probe = if path.as_os_str().is_empty() {
                Path::new(".")
            } else {
                path
            };
            canonical = std::fs::canonicalize(probe).map_err(|source| TreeError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            canonical.as_path()
        } else {
            path
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        Self::build_with_order(parent, &name, order)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Node for `id`. Ids are only minted by this tree, so lookup cannot miss.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn add_file(&mut self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        self.add_child(parent, Node::new(name, NodeKind::File))
    }

    pub fn add_directory(&mut self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        self.add_child(
            parent,
            Node::new(
                name,
                NodeKind::Directory {
                    children: Vec::new(),
                },
            ),
        )
    }

    fn add_child(&mut self, parent: NodeId, mut child: Node) -> Result<NodeId, TreeError> {
        let parent_node = self
            .get(parent)
            .ok_or_else(|| TreeError::Structural(format!("unknown parent {}", parent)))?;
        if parent_node.detached {
            return Err(TreeError::Structural(format!(
                "'{}' was removed from the tree",
                parent_node.name
            )));
        }
        if !parent_node.is_directory() {
            return Err(TreeError::NotADirectory(parent_node.name.clone()));
        }
        if child.parent.is_some() {
            return Err(TreeError::AlreadyAttached(child.name));
        }
        if self.child(parent, &child.name).is_some() {
            return Err(TreeError::DuplicateName {
                parent: parent_node.name.clone(),
                name: child.name,
            });
        }

        let id = NodeId(self.nodes.len());
        child.parent = Some(parent);
        self.nodes.push(child);
        if let NodeKind::Directory { children } = &mut self.nodes[parent.0].kind {
            children.push(id);
        }
        Ok(id)
    }

    /// Find a direct child of `dir` by name.
    pub fn child(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.get(dir)?
            .children()
            .iter()
            .copied()
            .find(|&id| self.node(id).name == name)
    }

    /// Detach the child called `name` from `dir`.
    ///
    /// The removed subtree stays in the arena but is no longer reachable from
    /// the root and refuses further structural queries.
    pub fn remove_child(&mut self, dir: NodeId, name: &str) -> Option<NodeId> {
        let removed = self.child(dir, name)?;
        if let NodeKind::Directory { children } = &mut self.nodes[dir.0].kind {
            children.retain(|&id| id != removed);
        }
        let subtree: Vec<NodeId> = self.traverse_from(removed).collect();
        for id in subtree {
            self.nodes[id.0].detached = true;
        }
        self.nodes[removed.0].parent = None;
        Some(removed)
    }

    /// Pre-order walk of the whole tree. Each call starts a fresh walk.
    pub fn traverse(&self) -> Traverse<'_> {
        self.traverse_from(self.root)
    }

    /// Pre-order walk of the subtree rooted at `start`.
    pub fn traverse_from(&self, start: NodeId) -> Traverse<'_> {
        Traverse {
            tree: self,
            stack: vec![start],
        }
    }

    /// Names from the root down to `id`, root first.
    pub fn segments(&self, id: NodeId) -> Vec<&str> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.node(cur);
            segments.push(node.name.as_str());
            current = node.parent;
        }
        segments.reverse();
        segments
    }

    /// Root-to-node path, including the root's own name.
    pub fn path(&self, id: NodeId) -> PathBuf {
        self.segments(id).into_iter().collect()
    }

    /// Path below the root (the root itself maps to an empty path).
    pub fn relative_path(&self, id: NodeId) -> PathBuf {
        self.segments(id).into_iter().skip(1).collect()
    }

    /// Distance from the root; the root has depth 0.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(cur) = current {
            depth += 1;
            current = self.node(cur).parent;
        }
        depth
    }

    /// The ancestor of `id` sitting directly below the root (possibly `id`
    /// itself). Returns `None` for the root.
    pub fn section_of(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        let node = self
            .get(id)
            .ok_or_else(|| TreeError::Structural(format!("unknown node {}", id)))?;
        if node.detached {
            return Err(TreeError::Structural(format!(
                "'{}' is not attached to the tree",
                node.name
            )));
        }

        let mut depth = self.depth(id);
        if depth == 0 {
            return Ok(None);
        }
        let mut current = id;
        while depth > 1 {
            current = self.node(current).parent.ok_or_else(|| {
                TreeError::Structural(format!(
                    "'{}' at depth {} has no parent",
                    self.node(current).name,
                    depth
                ))
            })?;
            depth -= 1;
        }
        Ok(Some(current))
    }
}

/// Pre-order iterator over a [`FileTree`].
pub struct Traverse<'a> {
    tree: &'a FileTree,
    stack: Vec<NodeId>,
}

impl Iterator for Traverse<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(id).children().iter().rev().copied());
        Some(id)
    }
}

fn walk_error(target: &Path, err: walkdir::Error) -> TreeError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| target.to_path_buf());
    let source = match err.into_io_error() {
        Some(io) => io,
        None => std::io::Error::other("filesystem loop detected"),
    };
    TreeError::Io { path, source }
}
