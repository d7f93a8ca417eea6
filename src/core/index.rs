//! In-memory snapshot of the store for navigation and fuzzy search.
//!
//! [`walk`] reads the filesystem once. [`tree_from_walk`] and
//! [`flat_from_walk`] are two independent pure passes over its output.

use crate::constants;
use crate::core::error::{StoreError, StoreResult};
use crate::models::node::{Branch, Leaf, NodeKind, StoreNode};
use crate::util::path as store_path;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One visited node, in depth-first order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub depth: usize,
    pub kind: NodeKind,
    pub name: String,
    pub path: PathBuf,
}

/// Depth-first walk under `root`. Within a directory, branches come before
/// leaves and each group is ordered by name. Hidden names and files without
/// `suffix` are skipped.
pub fn walk(root: &Path, suffix: &str) -> StoreResult<Vec<WalkEntry>> {
    let mut out = Vec::new();
    walk_dir(root, root, suffix, 0, &mut out)?;
    Ok(out)
}

fn walk_dir(
    root: &Path,
    dir: &Path,
    suffix: &str,
    depth: usize,
    out: &mut Vec<WalkEntry>,
) -> StoreResult<()> {
    let mut branches = Vec::new();
    let mut leaves = Vec::new();
    for dirent in fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))? {
        let dirent = dirent.map_err(|e| StoreError::io(dir, e))?;
        let path = dirent.path();
        let hidden = dirent.file_name().to_str().map_or(true, |n| n.starts_with('.'));
        if hidden {
            continue;
        }
        if path.is_dir() {
            if let Some(name) = path.strip_prefix(root).ok().and_then(store_path::relative_name) {
                branches.push((name, path));
            }
        } else if let Some(name) = store_path::entry_name(root, &path, suffix) {
            leaves.push((name, path));
        }
    }
    branches.sort();
    leaves.sort();

    for (name, path) in branches {
        out.push(WalkEntry {
            depth,
            kind: NodeKind::Branch,
            name,
            path: path.clone(),
        });
        walk_dir(root, &path, suffix, depth + 1, out)?;
    }
    out.extend(leaves.into_iter().map(|(name, path)| WalkEntry {
        depth,
        kind: NodeKind::Leaf,
        name,
        path,
    }));
    Ok(())
}

/// Rebuild the nested tree from a walk.
pub fn tree_from_walk(entries: &[WalkEntry]) -> Vec<StoreNode> {
    let mut pos = 0;
    level_from_walk(entries, &mut pos, 0)
}

fn level_from_walk(entries: &[WalkEntry], pos: &mut usize, depth: usize) -> Vec<StoreNode> {
    let mut nodes = Vec::new();
    while let Some(entry) = entries.get(*pos) {
        if entry.depth != depth {
            break;
        }
        *pos += 1;
        match entry.kind {
            NodeKind::Leaf => nodes.push(StoreNode::Leaf(Leaf::new(&entry.name, &entry.path))),
            NodeKind::Branch => {
                let children = level_from_walk(entries, pos, depth + 1);
                nodes.push(StoreNode::Branch(Branch {
                    name: entry.name.clone(),
                    path: entry.path.clone(),
                    children,
                }));
            }
        }
    }
    nodes
}

/// Every leaf of a walk, regardless of depth.
pub fn flat_from_walk(entries: &[WalkEntry]) -> Vec<Leaf> {
    entries
        .iter()
        .filter(|e| e.kind == NodeKind::Leaf)
        .map(|e| Leaf::new(&e.name, &e.path))
        .collect()
}

/// Fuzzy-match `term` against each leaf's full identifier, best match first.
///
/// Returns `None` when `term` is shorter than the search threshold: the caller
/// keeps showing whatever it was showing.
pub fn search(term: &str, flat: &[Leaf]) -> Option<Vec<Leaf>> {
    if term.chars().count() < constants::MIN_SEARCH_LEN {
        return None;
    }
    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored: Vec<(i64, &Leaf)> = flat
        .iter()
        .filter_map(|leaf| matcher.fuzzy_match(&leaf.name, term).map(|s| (s, leaf)))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    debug!(matches = scored.len(), "search");
    Some(scored.into_iter().map(|(_, leaf)| leaf.clone()).collect())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryIndex {
    pub tree: Vec<StoreNode>,
    pub flat: Vec<Leaf>,
}

impl DirectoryIndex {
    pub fn build(root: &Path, suffix: &str) -> StoreResult<Self> {
        let entries = walk(root, suffix)?;
        let index = Self::from_walk(&entries);
        debug!(root = %root.display(), leaves = index.flat.len(), "index built");
        Ok(index)
    }

    pub fn from_walk(entries: &[WalkEntry]) -> Self {
        Self {
            tree: tree_from_walk(entries),
            flat: flat_from_walk(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    pub fn search(&self, term: &str) -> Option<Vec<Leaf>> {
        search(term, &self.flat)
    }

    /// Drop the leaf at `path` after a delete. Returns whether it was present.
    pub fn remove_leaf(&mut self, path: &Path) -> bool {
        let before = self.flat.len();
        self.flat.retain(|l| l.path != path);
        let removed_from_tree = remove_from(&mut self.tree, path);
        removed_from_tree || self.flat.len() != before
    }
}

fn remove_from(nodes: &mut Vec<StoreNode>, path: &Path) -> bool {
    if let Some(pos) = nodes
        .iter()
        .position(|n| n.kind() == NodeKind::Leaf && n.path() == path)
    {
        nodes.remove(pos);
        return true;
    }
    nodes.iter_mut().any(|n| match n {
        StoreNode::Branch(b) => path.starts_with(&b.path) && remove_from(&mut b.children, path),
        StoreNode::Leaf(_) => false,
    })
}

/// Browsing state: the list on screen plus a stack of previous lists.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    current: Vec<StoreNode>,
    stack: Vec<Vec<StoreNode>>,
}

impl Navigator {
    pub fn new(top: Vec<StoreNode>) -> Self {
        Self {
            current: top,
            stack: Vec::new(),
        }
    }

    pub fn view(&self) -> &[StoreNode] {
        &self.current
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Open the node at `position`. A branch pushes the current view and shows
    /// its children; a leaf is returned and the view stays put.
    pub fn enter(&mut self, position: usize) -> Option<Leaf> {
        match self.current.get(position)? {
            StoreNode::Leaf(leaf) => Some(leaf.clone()),
            StoreNode::Branch(branch) => {
                let children = branch.children.clone();
                self.stack.push(std::mem::replace(&mut self.current, children));
                None
            }
        }
    }

    /// Return to the previous view. False when already at the top.
    pub fn back(&mut self) -> bool {
        match self.stack.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    /// Show search results as a flat list. An empty term goes back; a short
    /// term changes nothing.
    pub fn search(&mut self, term: &str, flat: &[Leaf]) {
        if term.is_empty() {
            self.back();
            return;
        }
        if let Some(results) = search(term, flat) {
            let results = results.into_iter().map(StoreNode::Leaf).collect();
            self.stack.push(std::mem::replace(&mut self.current, results));
        }
    }

    /// Start over from a freshly built tree.
    pub fn reset(&mut self, top: Vec<StoreNode>) {
        self.current = top;
        self.stack.clear();
    }
}
