/// duscope core — scanning, data model, and navigation.
///
/// This crate contains all business logic with zero UI dependencies.
/// Terminal rendering, key bindings, and argument parsing live in the
/// frontends; they exchange only the in-memory tree and the navigator's
/// command/query API with this crate.
///
/// # Modules
///
/// - [`model`] — Arena-allocated file tree, size metrics, formatting.
/// - [`scanner`] — Bounded-worker-pool filesystem scanning with progress
///   reporting and per-entry error recording.
/// - [`navigator`] — The enter/back/delete/sort navigation state machine.
/// - [`platform`] — On-disk size and mode-bit extraction per OS.
pub mod model;
pub mod navigator;
pub mod platform;
pub mod scanner;

pub use model::{DirEntryKind, FileNode, FileTree, NodeIndex, SizeMetric};
pub use navigator::{ListingEntry, NavError, Navigator, SortKey, ViewOptions};
pub use scanner::{scan, start_scan, CancelFlag, ScanHandle, ScanOptions, ScanOutcome};
