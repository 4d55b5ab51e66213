//! Assembles the flat scanner entry stream into the owning tree.
//!
//! Every entry message is tagged with its parent directory path; the
//! builder maintains the path → `NodeIndex` map, links children into the
//! arena, and runs the single bottom-up aggregation pass once the stream
//! ends. Because workers always emit a folder before scheduling it, parents
//! reach the builder before their children and the reverse-index
//! aggregation precondition (children after parents in the arena) holds.

use crate::model::{FileNode, FileTree, NodeIndex};
use compact_str::CompactString;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Initial arena capacity; grows as needed but avoids early re-allocation
/// on typical home-directory scans.
const ESTIMATED_NODES: usize = 65_536;

pub(crate) struct TreeBuilder {
    tree: FileTree,
    /// Map from directory path to its arena index, scan-lifetime only.
    dir_map: HashMap<PathBuf, NodeIndex>,
    root_path: PathBuf,
}

impl TreeBuilder {
    /// Start a tree from the scan root's own node.
    pub fn new(root_path: PathBuf, root: FileNode) -> Self {
        let tree = FileTree::with_root(root, ESTIMATED_NODES);
        let mut dir_map = HashMap::with_capacity(1_024);
        dir_map.insert(root_path.clone(), tree.root());
        Self {
            tree,
            dir_map,
            root_path,
        }
    }

    /// Link one discovered entry under its parent directory.
    pub fn insert(&mut self, parent: &Path, node: FileNode) {
        let parent_idx = match self.dir_map.get(parent) {
            Some(&idx) => idx,
            None => self.ensure_ancestors(parent),
        };
        if node.is_folder() {
            let full = parent.join(node.name.as_str());
            if let Some(&existing) = self.dir_map.get(&full) {
                // The folder was provisionally created by ensure_ancestors;
                // fill in its real metadata rather than duplicating the
                // child name under this parent.
                let slot = self.tree.node_mut(existing);
                slot.self_size = node.self_size;
                slot.self_allocated = node.self_allocated;
                slot.mode = node.mode;
                slot.modified = node.modified;
                return;
            }
            let idx = self.tree.add_node(node);
            self.tree.add_child(parent_idx, idx);
            self.dir_map.insert(full, idx);
        } else {
            let idx = self.tree.add_node(node);
            self.tree.add_child(parent_idx, idx);
        }
    }

    /// Flag a known folder as unreadable (its listing failed after it was
    /// discovered). The folder keeps its own base allocation.
    pub fn mark_unreadable(&mut self, path: &Path) {
        if let Some(&idx) = self.dir_map.get(path) {
            self.tree.node_mut(idx).is_error = true;
        }
    }

    /// Number of nodes inserted so far.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Run the bottom-up aggregation pass and hand over the finished tree.
    pub fn finish(mut self) -> FileTree {
        self.tree.aggregate_sizes();
        self.tree
    }

    /// Recreate a missing ancestor chain from the root down.
    ///
    /// Message causality normally guarantees the parent is present; this
    /// keeps the builder correct even if that assumption is ever violated.
    fn ensure_ancestors(&mut self, target: &Path) -> NodeIndex {
        let mut missing: Vec<PathBuf> = Vec::new();
        let mut current = target.to_path_buf();

        while !self.dir_map.contains_key(&current) && current != self.root_path {
            missing.push(current.clone());
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        let root = self.tree.root();
        let mut parent_idx = self.dir_map.get(&current).copied().unwrap_or(root);

        for ancestor in missing.into_iter().rev() {
            let name = ancestor
                .file_name()
                .map(|n| CompactString::new(n.to_string_lossy()))
                .unwrap_or_default();
            let node = FileNode::new_folder(name, 0, 0, Some(parent_idx));
            let idx = self.tree.add_node(node);
            self.tree.add_child(parent_idx, idx);
            self.dir_map.insert(ancestor, idx);
            parent_idx = idx;
        }

        parent_idx
    }
}
