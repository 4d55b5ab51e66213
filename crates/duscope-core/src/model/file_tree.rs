//! Arena-backed file tree with O(n) bottom-up size aggregation.
//!
//! All nodes live in a single `Vec<FileNode>`. Relationships between nodes
//! use `NodeIndex` (a thin `u32` wrapper) rather than heap pointers, giving
//! cache-friendly traversal and cheap non-owning history stacks.
//!
//! The tree is built once per scan and mutated only through
//! [`FileTree::detach_child`], which unlinks one child and subtracts its
//! contribution (both metrics) from every ancestor. All other structural
//! changes require a rebuild.

use super::file_node::{DirEntryKind, FileNode, NodeIndex};
use super::size::SizeMetric;
use std::path::PathBuf;

/// The complete file tree produced by a scan: one root folder that owns
/// every descendant.
#[derive(Debug, Clone)]
pub struct FileTree {
    /// Arena: every node in a flat, cache-friendly vector. Detached nodes
    /// stay in the arena but are unreachable from the root.
    pub nodes: Vec<FileNode>,

    root: NodeIndex,
}

impl FileTree {
    /// Create a tree containing only `root`, with pre-allocated capacity.
    ///
    /// `estimated_nodes` should be a rough upper bound. The arena grows if
    /// needed, but pre-allocation avoids repeated re-allocation while the
    /// scanner is inserting.
    pub fn with_root(root: FileNode, estimated_nodes: usize) -> Self {
        let mut nodes = Vec::with_capacity(estimated_nodes);
        nodes.push(root);
        Self {
            nodes,
            root: NodeIndex::new(0),
        }
    }

    /// The root folder's index.
    #[inline]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Allocate a new node in the arena and return its index.
    pub fn add_node(&mut self, node: FileNode) -> NodeIndex {
        let idx = NodeIndex::new(self.nodes.len());
        self.nodes.push(node);
        idx
    }

    /// Attach `child` as a child of `parent`, prepending to the sibling list.
    ///
    /// O(1) — new children are inserted at the head of the linked list.
    /// Listing order is decided at view time, not insertion time.
    pub fn add_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        let old_first = self.nodes[parent.idx()].first_child;
        self.nodes[child.idx()].next_sibling = old_first;
        self.nodes[child.idx()].parent = Some(parent);
        self.nodes[parent.idx()].first_child = Some(child);
    }

    /// Compute aggregated sizes (both metrics) and descendant file counts
    /// in a single bottom-up pass.
    ///
    /// Because children are always inserted after their parent in the arena
    /// (entries arrive parent-first), iterating in *reverse* guarantees that
    /// every child is processed before its parent. This gives O(n)
    /// aggregation with no recursion and no stack.
    ///
    /// Safe to call repeatedly — folder aggregates are reset to their own
    /// base allocation before each pass, so an empty folder still reports
    /// its directory-entry size.
    pub fn aggregate_sizes(&mut self) {
        for node in self.nodes.iter_mut() {
            if node.is_folder() {
                node.size = node.self_size;
                node.allocated = node.self_allocated;
                node.descendant_files = 0;
            }
        }

        // Reverse pass: children before parents. Folder aggregates are
        // complete by the time the folder itself propagates upward.
        for i in (0..self.nodes.len()).rev() {
            let node = &self.nodes[i];
            let (size, alloc, files) = match node.kind {
                DirEntryKind::Folder => (node.size, node.allocated, node.descendant_files),
                DirEntryKind::File | DirEntryKind::Symlink => (node.size, node.allocated, 1),
            };
            // Detached nodes keep their parent link but are unreachable;
            // they must not contribute to aggregates.
            if node.is_detached {
                continue;
            }
            if let Some(parent) = node.parent {
                self.nodes[parent.idx()].size += size;
                self.nodes[parent.idx()].allocated += alloc;
                self.nodes[parent.idx()].descendant_files += files;
            }
        }
    }

    /// Find a direct child of `parent` by name.
    pub fn child_named(&self, parent: NodeIndex, name: &str) -> Option<NodeIndex> {
        let mut cursor = self.nodes[parent.idx()].first_child;
        while let Some(idx) = cursor {
            if self.nodes[idx.idx()].name == name {
                return Some(idx);
            }
            cursor = self.nodes[idx.idx()].next_sibling;
        }
        None
    }

    /// Unlink the child named `name` from `parent` and subtract its
    /// contribution (both metrics and file count) from `parent` and every
    /// ancestor up to the root.
    ///
    /// The detached node stays in the arena — only one parent's child list
    /// is patched — so existing `NodeIndex` values elsewhere stay valid.
    /// Returns the detached index, or `None` if no such child exists.
    pub fn detach_child(&mut self, parent: NodeIndex, name: &str) -> Option<NodeIndex> {
        let victim = self.child_named(parent, name)?;

        // Patch the sibling list.
        let next = self.nodes[victim.idx()].next_sibling;
        if self.nodes[parent.idx()].first_child == Some(victim) {
            self.nodes[parent.idx()].first_child = next;
        } else {
            let mut cursor = self.nodes[parent.idx()].first_child;
            while let Some(idx) = cursor {
                if self.nodes[idx.idx()].next_sibling == Some(victim) {
                    self.nodes[idx.idx()].next_sibling = next;
                    break;
                }
                cursor = self.nodes[idx.idx()].next_sibling;
            }
        }
        self.nodes[victim.idx()].next_sibling = None;
        self.nodes[victim.idx()].is_detached = true;

        // Propagate the delta to every ancestor so the aggregation
        // invariant holds without a full re-pass.
        let node = &self.nodes[victim.idx()];
        let delta_size = node.size;
        let delta_alloc = node.allocated;
        let delta_files = match node.kind {
            DirEntryKind::Folder => node.descendant_files,
            DirEntryKind::File | DirEntryKind::Symlink => 1,
        };
        let mut cursor = Some(parent);
        while let Some(idx) = cursor {
            self.nodes[idx.idx()].size -= delta_size;
            self.nodes[idx.idx()].allocated -= delta_alloc;
            self.nodes[idx.idx()].descendant_files -= delta_files;
            cursor = self.nodes[idx.idx()].parent;
        }

        Some(victim)
    }

    /// Reconstruct the full path for a node by walking up to the root.
    ///
    /// The root's name holds the scan root path, so the result is a real
    /// filesystem path.
    pub fn full_path(&self, index: NodeIndex) -> PathBuf {
        let mut segments = Vec::new();
        let mut current = Some(index);
        while let Some(idx) = current {
            segments.push(self.nodes[idx.idx()].name.as_str());
            current = self.nodes[idx.idx()].parent;
        }
        let mut path = PathBuf::new();
        for segment in segments.into_iter().rev() {
            path.push(segment);
        }
        path
    }

    /// Direct children of a node, in arena (insertion-list) order.
    pub fn children(&self, parent: NodeIndex) -> Vec<NodeIndex> {
        let mut children = Vec::new();
        let mut cursor = self.nodes[parent.idx()].first_child;
        while let Some(idx) = cursor {
            children.push(idx);
            cursor = self.nodes[idx.idx()].next_sibling;
        }
        children
    }

    /// Get the node at the given index.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &FileNode {
        &self.nodes[index.idx()]
    }

    /// Mutable access to the node at the given index.
    #[inline]
    pub fn node_mut(&mut self, index: NodeIndex) -> &mut FileNode {
        &mut self.nodes[index.idx()]
    }

    /// The root's aggregated size under the given metric.
    #[inline]
    pub fn total(&self, metric: SizeMetric) -> u64 {
        let root = &self.nodes[self.root.idx()];
        match metric {
            SizeMetric::Apparent => root.size,
            SizeMetric::OnDisk => root.allocated,
        }
    }

    /// Total number of nodes in the arena, including detached ones.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree contains no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
