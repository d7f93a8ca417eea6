//! Directory-tree elements of the store.

use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Leaf,
    Branch,
}

/// A file-backed entry. `name` is the identifier relative to the store root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leaf {
    pub name: String,
    pub path: PathBuf,
}

impl Leaf {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Last path segment of the identifier, for display.
    pub fn label(&self) -> &str {
        last_segment(&self.name)
    }
}

/// A directory. Children are ordered branches first, then leaves, each by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    pub path: PathBuf,
    pub children: Vec<StoreNode>,
}

impl Branch {
    pub fn label(&self) -> &str {
        last_segment(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreNode {
    Leaf(Leaf),
    Branch(Branch),
}

impl StoreNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            StoreNode::Leaf(_) => NodeKind::Leaf,
            StoreNode::Branch(_) => NodeKind::Branch,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StoreNode::Leaf(l) => &l.name,
            StoreNode::Branch(b) => &b.name,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StoreNode::Leaf(l) => l.label(),
            StoreNode::Branch(b) => b.label(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            StoreNode::Leaf(l) => &l.path,
            StoreNode::Branch(b) => &b.path,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            StoreNode::Leaf(l) => Some(l),
            StoreNode::Branch(_) => None,
        }
    }
}

fn last_segment(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
