//! Aggregate file tree
//!
//! Built from discovery records as a pure transform. Nodes live in an arena
//! (`Vec<TreeNode>`), children are ordered by name and parents are plain
//! indices. Directory totals are cached behind `Cell`/`RefCell` and
//! recomputed from direct children on the first read after a change below
//! them. The tree is meant for a single owner; it is not `Sync`.

pub mod analysis;
pub mod node;

pub use node::{Aggregate, NodeId, NodeKind, TreeNode};

use std::cell::Cell;
use std::collections::BTreeMap;

use crate::core::error::TreeError;
use crate::core::model::FileRecords;
use crate::core::paths::{extension, segments};
use tracing::warn;

/// Hierarchy of files and directories with lazy totals
#[derive(Debug)]
pub struct FileTree {
    nodes: Vec<TreeNode>,
    recomputations: Cell<usize>,
}

impl FileTree {
    /// The root directory (relative path "")
    pub const ROOT: NodeId = NodeId(0);

    /// Build the hierarchy; directory totals are computed on first read.
    ///
    /// Record paths must not nest (`a` and `a/b` cannot both be files, as
    /// on a real filesystem). A record that would nest under, or replace
    /// the directory of, an earlier one is skipped with a warning, so
    /// `file_paths()` returns the input set exactly when this holds.
    pub fn build(records: &FileRecords) -> Self {
        let mut tree = Self {
            nodes: vec![TreeNode::new("", String::new(), None, NodeKind::directory())],
            recomputations: Cell::new(0),
        };

        for (path, record) in records {
            let Some(id) = tree.insert_path(path) else {
                continue;
            };
            let node = &mut tree.nodes[id.0];
            if node.is_directory() {
                warn!(path = %path, "record path is a directory of another record; skipping");
                continue;
            }
            node.extension = extension(path);
            node.flags = record.flags.clone();
            node.kind = NodeKind::File(Aggregate {
                size: record.size,
                tokens: record.tokens.clone(),
            });
        }
        tree
    }

    /// Build and compute every directory total right away
    pub fn build_eager(records: &FileRecords) -> Self {
        let tree = Self::build(records);
        tree.recompute_all();
        tree
    }

    /// Create the nodes along `path`; returns the leaf.
    ///
    /// Intermediate nodes are directories. Returns `None` for the empty
    /// path and for paths passing through an existing file.
    fn insert_path(&mut self, path: &str) -> Option<NodeId> {
        let parts: Vec<&str> = segments(path).collect();
        if parts.is_empty() {
            return None;
        }

        let mut current = Self::ROOT;
        let mut current_path = String::new();
        for (i, part) in parts.iter().enumerate() {
            let is_last = i + 1 == parts.len();
            if !current_path.is_empty() {
                current_path.push('/');
            }
            current_path.push_str(part);

            let existing = match &self.nodes[current.0].kind {
                NodeKind::Directory { children, .. } => children.get(*part).copied(),
                NodeKind::File(_) => {
                    warn!(
                        path = %path,
                        file = %self.nodes[current.0].relative_path,
                        "record path nests under a file; skipping"
                    );
                    return None;
                }
            };

            current = match existing {
                Some(id) => id,
                None => {
                    let kind = if is_last {
                        NodeKind::File(Aggregate::default())
                    } else {
                        NodeKind::directory()
                    };
                    let id = NodeId(self.nodes.len());
                    self.nodes
                        .push(TreeNode::new(part, current_path.clone(), Some(current), kind));
                    if let NodeKind::Directory { children, .. } = &mut self.nodes[current.0].kind {
                        children.insert(part.to_string(), id);
                    }
                    id
                }
            };
        }
        Some(current)
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// Number of nodes, directories included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn node(&self, id: NodeId) -> Result<&TreeNode, TreeError> {
        self.nodes.get(id.0).ok_or(TreeError::UnknownNode(id.0))
    }

    /// Node at a relative path ("" is the root)
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut current = Self::ROOT;
        for part in segments(path) {
            current = match &self.nodes[current.0].kind {
                NodeKind::Directory { children, .. } => *children.get(part)?,
                NodeKind::File(_) => return None,
            };
        }
        Some(current)
    }

    /// Children ordered by name (empty for files)
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.nodes[id.0].kind {
            NodeKind::Directory { children, .. } => children.values().copied().collect(),
            NodeKind::File(_) => Vec::new(),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Whether a directory's cached totals are stale (files are never dirty)
    pub fn is_dirty(&self, id: NodeId) -> bool {
        match &self.nodes[id.0].kind {
            NodeKind::Directory { dirty, .. } => dirty.get(),
            NodeKind::File(_) => false,
        }
    }

    /// How many directory recomputations have run so far
    pub fn recomputations(&self) -> usize {
        self.recomputations.get()
    }

    /// Size in bytes; directory totals are refreshed if stale
    pub fn size(&self, id: NodeId) -> u64 {
        match &self.nodes[id.0].kind {
            NodeKind::File(metrics) => metrics.size,
            NodeKind::Directory { aggregate, .. } => {
                self.ensure_clean(id);
                aggregate.borrow().size
            }
        }
    }

    /// Token counts per model; directory totals are refreshed if stale
    pub fn tokens(&self, id: NodeId) -> BTreeMap<String, u64> {
        self.stats(id).tokens
    }

    /// Size and tokens together
    pub fn stats(&self, id: NodeId) -> Aggregate {
        match &self.nodes[id.0].kind {
            NodeKind::File(metrics) => metrics.clone(),
            NodeKind::Directory { aggregate, .. } => {
                self.ensure_clean(id);
                aggregate.borrow().clone()
            }
        }
    }

    fn ensure_clean(&self, id: NodeId) {
        if self.is_dirty(id) {
            self.recompute(id);
        }
    }

    /// Refresh one directory from its direct children and clear its bit.
    ///
    /// Stale child directories are refreshed on the way, through their own
    /// reads.
    fn recompute(&self, id: NodeId) {
        let NodeKind::Directory {
            children,
            aggregate,
            dirty,
        } = &self.nodes[id.0].kind
        else {
            return;
        };

        let mut total = Aggregate::default();
        for &child in children.values() {
            match &self.nodes[child.0].kind {
                NodeKind::File(metrics) => total.absorb(metrics.size, &metrics.tokens),
                NodeKind::Directory {
                    aggregate: child_aggregate,
                    ..
                } => {
                    self.ensure_clean(child);
                    let child_total = child_aggregate.borrow();
                    total.absorb(child_total.size, &child_total.tokens);
                }
            }
        }

        *aggregate.borrow_mut() = total;
        dirty.set(false);
        self.recomputations.set(self.recomputations.get() + 1);
    }

    /// Recompute every directory in one pass, children before parents
    pub fn recompute_all(&self) {
        // Children are always allocated after their parent
        for index in (0..self.nodes.len()).rev() {
            if self.nodes[index].is_directory() {
                self.recompute(NodeId(index));
            }
        }
    }

    /// Replace a file's size, and its token counts when given
    pub fn set_file_metrics(
        &mut self,
        id: NodeId,
        size: u64,
        tokens: Option<BTreeMap<String, u64>>,
    ) -> Result<(), TreeError> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or(TreeError::UnknownNode(id.0))?;
        match &mut node.kind {
            NodeKind::File(metrics) => {
                metrics.size = size;
                if let Some(tokens) = tokens {
                    metrics.tokens = tokens;
                }
            }
            NodeKind::Directory { .. } => {
                return Err(TreeError::NotAFile(node.relative_path.clone()));
            }
        }
        self.mark_dirty_up(id);
        Ok(())
    }

    /// Add a flag to a file and invalidate its ancestors
    pub fn mark_flag(&mut self, id: NodeId, flag: &str) -> Result<(), TreeError> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or(TreeError::UnknownNode(id.0))?;
        if node.is_directory() {
            return Err(TreeError::NotAFile(node.relative_path.clone()));
        }
        node.flags.insert(flag.to_string());
        self.mark_dirty_up(id);
        Ok(())
    }

    fn mark_dirty_up(&self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.0];
            if let NodeKind::Directory { dirty, .. } = &node.kind {
                dirty.set(true);
            }
            current = node.parent;
        }
    }

    /// Node ids in pre-order (parents before children, siblings by name)
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        order
    }

    /// Relative paths of every file, in pre-order
    pub fn file_paths(&self) -> Vec<String> {
        self.preorder()
            .into_iter()
            .map(|id| &self.nodes[id.0])
            .filter(|node| node.is_file())
            .map(|node| node.relative_path.clone())
            .collect()
    }
}
