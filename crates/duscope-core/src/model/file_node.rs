//! A single node in the arena-allocated file tree.
//!
//! Nodes are stored in a flat `Vec<FileNode>` for cache-friendly traversal.
//! Parent-child relationships use indices rather than pointers, so the
//! navigator's history stack can hold plain indices and a deletion only
//! patches one parent's child list.

use compact_str::CompactString;
use std::time::SystemTime;

/// Lightweight index into the arena `Vec<FileNode>`.
///
/// Uses `u32` to keep nodes small — supports up to ~4 billion nodes,
/// which is more than enough for any real filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`, panicking if it exceeds `u32::MAX`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// What kind of directory entry a node represents.
///
/// Handled exhaustively at every consumption site — symlinks are never
/// silently treated as the file they point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirEntryKind {
    File,
    Folder,
    /// A symbolic link. Counted with the size of the link itself;
    /// never followed during scanning.
    Symlink,
}

/// A single file or folder in the tree.
///
/// Stored in a flat arena (`Vec<FileNode>`). Children are linked via a
/// `first_child` / `next_sibling` list so that no per-node `Vec<NodeIndex>`
/// allocation is needed.
///
/// Both size metrics are captured at stat time: `size` (apparent, as
/// reported by file length) and `allocated` (on-disk, allocation-unit
/// rounded). Switching the display metric later never re-scans.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// File or folder name only (NOT the full path), except for the scan
    /// root, whose name holds the full root path. Full paths are
    /// reconstructed on demand by walking up via `parent`.
    pub name: CompactString,

    /// Apparent size in bytes. For folders this is the aggregated value:
    /// own base allocation plus the sum of all descendant sizes.
    pub size: u64,

    /// On-disk size in bytes (allocation-unit rounded). Aggregated for
    /// folders, same as `size`.
    pub allocated: u64,

    /// The entry's own base apparent size. For files this equals `size`;
    /// for folders it is the size of the directory entry itself, which an
    /// empty folder still contributes to its aggregate.
    pub self_size: u64,

    /// The entry's own base on-disk size.
    pub self_allocated: u64,

    pub kind: DirEntryKind,

    /// Raw permission/type bits as reported by the platform (0 where
    /// unavailable). Presentation layers use these for mode columns.
    pub mode: u32,

    /// Last-modified timestamp.
    pub modified: Option<SystemTime>,

    /// Optional metadata fingerprint, present only when the scan was run
    /// with fingerprinting enabled.
    pub fingerprint: Option<u64>,

    /// Index of the parent node. `None` only for the scan root.
    pub parent: Option<NodeIndex>,

    /// First child (folders only). Children form a singly-linked list
    /// via `next_sibling`.
    pub first_child: Option<NodeIndex>,

    /// Next sibling under the same parent.
    pub next_sibling: Option<NodeIndex>,

    /// Total number of descendant *files* (not folders).
    /// Used for the "N items" display column.
    pub descendant_files: u64,

    /// `true` if this entry could not be read (e.g. access denied) or was
    /// skipped as a cycle. The node stays in the tree with zero size so
    /// users can see where errors occurred.
    pub is_error: bool,

    /// `true` once the node has been unlinked from its parent's child list.
    /// Detached nodes stay in the arena but never contribute to aggregates.
    pub is_detached: bool,
}

impl FileNode {
    /// Create a new file or symlink leaf with both sizes captured.
    pub fn new_leaf(
        name: CompactString,
        kind: DirEntryKind,
        size: u64,
        allocated: u64,
        parent: Option<NodeIndex>,
    ) -> Self {
        debug_assert!(kind != DirEntryKind::Folder);
        Self {
            name,
            size,
            allocated,
            self_size: size,
            self_allocated: allocated,
            kind,
            mode: 0,
            modified: None,
            fingerprint: None,
            parent,
            first_child: None,
            next_sibling: None,
            descendant_files: 0,
            is_error: false,
            is_detached: false,
        }
    }

    /// Create a new folder node with its own base allocation.
    ///
    /// `size`/`allocated` start at the base values and are replaced by the
    /// aggregation pass.
    pub fn new_folder(
        name: CompactString,
        self_size: u64,
        self_allocated: u64,
        parent: Option<NodeIndex>,
    ) -> Self {
        Self {
            name,
            size: self_size,
            allocated: self_allocated,
            self_size,
            self_allocated,
            kind: DirEntryKind::Folder,
            mode: 0,
            modified: None,
            fingerprint: None,
            parent,
            first_child: None,
            next_sibling: None,
            descendant_files: 0,
            is_error: false,
            is_detached: false,
        }
    }

    /// Create a zero-size error placeholder (unreadable entry or skipped
    /// cycle).
    pub fn new_error(name: CompactString, kind: DirEntryKind, parent: Option<NodeIndex>) -> Self {
        Self {
            name,
            size: 0,
            allocated: 0,
            self_size: 0,
            self_allocated: 0,
            kind,
            mode: 0,
            modified: None,
            fingerprint: None,
            parent,
            first_child: None,
            next_sibling: None,
            descendant_files: 0,
            is_error: true,
            is_detached: false,
        }
    }

    /// `true` if this node is a folder.
    #[inline]
    pub fn is_folder(&self) -> bool {
        self.kind == DirEntryKind::Folder
    }
}
