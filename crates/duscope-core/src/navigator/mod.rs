//! Stateful cursor over a scanned tree.
//!
//! The navigator owns the [`FileTree`] and keeps a history stack of arena
//! indices (never pointers), so deleting an entry only patches one parent
//! and invalidates nothing the stack holds. All transitions are
//! synchronous; the caller drives them from one serialized command stream,
//! so no internal locking is needed. Every failure is local: a failed
//! transition leaves the state exactly as it was.

pub mod options;

pub use options::{SortKey, ViewOptions};

use crate::model::{DirEntryKind, FileTree, NodeIndex, SizeMetric};
use compact_str::CompactString;
use std::cmp::Ordering;
use std::path::PathBuf;
use std::time::SystemTime;
use thiserror::Error;

/// A recoverable navigator failure. State is unchanged when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    /// No child with that name in the current folder.
    #[error("no entry named `{0}` in the current folder")]
    NotFound(CompactString),
    /// The named child exists but is not a folder.
    #[error("`{0}` is not a folder")]
    InvalidTarget(CompactString),
}

/// One row of the current listing, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingEntry {
    pub name: CompactString,
    pub kind: DirEntryKind,
    pub apparent_size: u64,
    pub allocated_size: u64,
    pub modified: Option<SystemTime>,
    /// Descendant file count (0 for files), for the item-count column.
    pub items: u64,
    /// This entry's share of the root total under the active metric,
    /// in `0.0..=1.0`, for the proportional size bar.
    pub fraction: f64,
    /// The entry could not be read or was skipped as a cycle.
    pub is_error: bool,
}

impl ListingEntry {
    /// The entry's size under the given metric.
    #[inline]
    pub fn size(&self, metric: SizeMetric) -> u64 {
        match metric {
            SizeMetric::Apparent => self.apparent_size,
            SizeMetric::OnDisk => self.allocated_size,
        }
    }

    #[inline]
    pub fn is_folder(&self) -> bool {
        self.kind == DirEntryKind::Folder
    }
}

/// Navigation state machine over one scanned tree.
pub struct Navigator {
    tree: FileTree,
    current: NodeIndex,
    /// History from root to (excluding) the current folder.
    ancestors: Vec<NodeIndex>,
    options: ViewOptions,
}

impl Navigator {
    /// Wrap a finished tree; the cursor starts at the root with an empty
    /// history stack.
    pub fn new(tree: FileTree, options: ViewOptions) -> Self {
        let current = tree.root();
        Self {
            tree,
            current,
            ancestors: Vec::new(),
            options,
        }
    }

    /// Descend into the subfolder named `name`.
    pub fn enter(&mut self, name: &str) -> Result<(), NavError> {
        let child = self
            .tree
            .child_named(self.current, name)
            .ok_or_else(|| NavError::NotFound(CompactString::new(name)))?;
        if !self.tree.node(child).is_folder() {
            return Err(NavError::InvalidTarget(CompactString::new(name)));
        }
        self.ancestors.push(self.current);
        self.current = child;
        Ok(())
    }

    /// Return to the previous folder. No-op at the root; returns whether
    /// the cursor moved.
    pub fn back(&mut self) -> bool {
        match self.ancestors.pop() {
            Some(parent) => {
                self.current = parent;
                true
            }
            None => false,
        }
    }

    /// Remove the named child from the current folder and propagate the
    /// size delta to every ancestor.
    ///
    /// Only the in-memory tree is mutated. The returned path is the
    /// removal request for the external collaborator that performs (and
    /// reports) the actual filesystem deletion.
    pub fn delete(&mut self, name: &str) -> Result<PathBuf, NavError> {
        let child = self
            .tree
            .child_named(self.current, name)
            .ok_or_else(|| NavError::NotFound(CompactString::new(name)))?;
        let path = self.tree.full_path(child);
        self.tree.detach_child(self.current, name);
        Ok(path)
    }

    /// Change the primary sort key and direction.
    pub fn set_sort_order(&mut self, key: SortKey, descending: bool) {
        self.options.sort_key = key;
        self.options.descending = descending;
    }

    /// Group folders before files in listings.
    pub fn set_directories_first(&mut self, directories_first: bool) {
        self.options.directories_first = directories_first;
    }

    /// Switch the active size metric. O(1): both metrics were captured at
    /// scan time.
    pub fn set_metric(&mut self, metric: SizeMetric) {
        self.options.metric = metric;
    }

    /// Show or hide dot-entries in listings. Display-only; hidden entries
    /// still count toward every aggregate.
    pub fn set_show_hidden(&mut self, show_hidden: bool) {
        self.options.show_hidden = show_hidden;
    }

    /// The current folder's children as an ordered listing.
    ///
    /// Folders precede files when directories-first is set; within each
    /// group the active sort key orders entries, with ties broken by name
    /// ascending. Pure query: calling it twice with no intervening
    /// transition yields identical output.
    pub fn current_listing(&self) -> Vec<ListingEntry> {
        let root_total = self.tree.total(self.options.metric);
        let mut entries: Vec<ListingEntry> = self
            .tree
            .children(self.current)
            .into_iter()
            .map(|idx| self.tree.node(idx))
            .filter(|node| self.options.show_hidden || !node.name.starts_with('.'))
            .map(|node| {
                let size = match self.options.metric {
                    SizeMetric::Apparent => node.size,
                    SizeMetric::OnDisk => node.allocated,
                };
                let fraction = if root_total > 0 {
                    size as f64 / root_total as f64
                } else {
                    0.0
                };
                ListingEntry {
                    name: node.name.clone(),
                    kind: node.kind,
                    apparent_size: node.size,
                    allocated_size: node.allocated,
                    modified: node.modified,
                    items: node.descendant_files,
                    fraction,
                    is_error: node.is_error,
                }
            })
            .collect();

        let options = self.options;
        entries.sort_by(|a, b| compare_entries(a, b, &options));
        entries
    }

    /// Full path of the current folder.
    pub fn current_path(&self) -> PathBuf {
        self.tree.full_path(self.current)
    }

    /// The root's aggregated size under the given metric.
    pub fn root_total(&self, metric: SizeMetric) -> u64 {
        self.tree.total(metric)
    }

    /// The current folder's aggregated size under the given metric.
    pub fn current_total(&self, metric: SizeMetric) -> u64 {
        let node = self.tree.node(self.current);
        match metric {
            SizeMetric::Apparent => node.size,
            SizeMetric::OnDisk => node.allocated,
        }
    }

    /// The active view options.
    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    /// Read access to the underlying tree.
    pub fn tree(&self) -> &FileTree {
        &self.tree
    }
}

/// Listing order: optional folder grouping, then the primary key with
/// direction, then name ascending as the tie-break.
fn compare_entries(a: &ListingEntry, b: &ListingEntry, options: &ViewOptions) -> Ordering {
    if options.directories_first {
        let group = b.is_folder().cmp(&a.is_folder());
        if group != Ordering::Equal {
            return group;
        }
    }

    let primary = match options.sort_key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Size => a.size(options.metric).cmp(&b.size(options.metric)),
        SortKey::ModTime => a.modified.cmp(&b.modified),
    };
    let primary = if options.descending {
        primary.reverse()
    } else {
        primary
    };
    primary.then_with(|| a.name.cmp(&b.name))
}
