//! Arena nodes of the aggregate tree

use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

/// Index of a node in its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Size and per-model token totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub size: u64,
    pub tokens: BTreeMap<String, u64>,
}

impl Aggregate {
    /// Add another total into this one, model by model
    pub fn absorb(&mut self, size: u64, tokens: &BTreeMap<String, u64>) {
        self.size += size;
        for (model, count) in tokens {
            *self.tokens.entry(model.clone()).or_default() += count;
        }
    }
}

/// Leaf or directory payload
#[derive(Debug)]
pub enum NodeKind {
    File(Aggregate),
    Directory {
        /// Child name to node, ordered by name
        children: BTreeMap<String, NodeId>,
        /// Cached totals, valid only while `dirty` is false
        aggregate: RefCell<Aggregate>,
        dirty: Cell<bool>,
    },
}

impl NodeKind {
    pub(crate) fn directory() -> Self {
        NodeKind::Directory {
            children: BTreeMap::new(),
            aggregate: RefCell::new(Aggregate::default()),
            dirty: Cell::new(true),
        }
    }
}

/// One file or directory
#[derive(Debug)]
pub struct TreeNode {
    /// Last path segment ("" for the root)
    pub name: String,
    pub relative_path: String,
    /// Lowercase extension of files, empty for directories
    pub extension: String,
    pub flags: BTreeSet<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl TreeNode {
    pub(crate) fn new(name: &str, relative_path: String, parent: Option<NodeId>, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            relative_path,
            extension: String::new(),
            flags: BTreeSet::new(),
            parent,
            kind,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn is_file(&self) -> bool {
        !self.is_directory()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_merges_models() {
        let mut total = Aggregate::default();
        total.absorb(3, &BTreeMap::from([("a".to_string(), 1)]));
        total.absorb(
            4,
            &BTreeMap::from([("a".to_string(), 2), ("b".to_string(), 5)]),
        );
        assert_eq!(total.size, 7);
        assert_eq!(total.tokens["a"], 3);
        assert_eq!(total.tokens["b"], 5);
    }

    #[test]
    fn test_directory_starts_dirty() {
        let node = TreeNode::new("", String::new(), None, NodeKind::directory());
        assert!(node.is_directory());
        match node.kind() {
            NodeKind::Directory { dirty, .. } => assert!(dirty.get()),
            NodeKind::File(_) => unreachable!(),
        }
    }
}
