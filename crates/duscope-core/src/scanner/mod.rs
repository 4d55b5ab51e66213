//! Scanner module — orchestrates concurrent filesystem scanning.
//!
//! A scan is one batch operation: a bounded [`pool`] of traversal workers
//! walks the subtree while this module's collector assembles their entry
//! stream into an owned [`FileTree`] via the [`builder`]. The finished
//! (or cancelled-partial) tree plus every recorded per-entry error comes
//! back in a [`ScanOutcome`]; there is no background re-scan or watching.

pub mod builder;
pub mod fingerprint;
pub mod pool;
pub mod progress;

use crate::model::{FileNode, FileTree, SizeMetric};
use crate::platform;
use builder::TreeBuilder;
use compact_str::CompactString;
use pool::{Job, ScanMessage, WalkUnit, WorkerPool};
use progress::{ScanError, ScanProgress};

use anyhow::{bail, Context};
use crossbeam_channel::{Receiver, Sender};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Shared cancellation signal. Setting it makes workers skip any unit they
/// have not yet started; the partial tree is still aggregated and returned.
pub type CancelFlag = Arc<AtomicBool>;

/// Configuration for one scan, fixed at start.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Number of traversal worker threads. Bounds peak memory and open
    /// file descriptors regardless of directory fan-out.
    pub worker_threads: usize,
    /// Preferred display metric; used for running totals in progress
    /// updates. Both metrics are always captured.
    pub metric: SizeMetric,
    /// Compute a metadata fingerprint for every file leaf. Off by default.
    pub compute_fingerprints: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
            metric: SizeMetric::default(),
            compute_fingerprints: false,
        }
    }
}

/// Everything a completed (or cancelled) scan produces.
#[derive(Debug)]
pub struct ScanOutcome {
    /// The aggregated tree. Partial if `cancelled` is set.
    pub tree: FileTree,
    /// Every non-fatal error recorded during traversal.
    pub errors: Vec<ScanError>,
    /// `true` if the caller cancelled the scan before completion.
    pub cancelled: bool,
    pub duration: Duration,
}

/// Maximum number of progress messages that may queue up in the channel.
///
/// Stale `Update` messages are dropped rather than blocking the collector;
/// terminal messages always fit because there is at most one of them.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Capacity of the worker → collector entry channel. When the collector
/// falls behind, workers block on `send`, which bounds buffered entries.
const RESULT_CHANNEL_CAPACITY: usize = 16_384;

/// Entries between progress updates.
const UPDATE_INTERVAL: u64 = 1_024;

/// Scan `root` to completion, blocking the calling thread.
///
/// Per-entry failures degrade to recorded errors; only an unreadable root
/// is fatal.
pub fn scan(root: &Path, options: &ScanOptions, cancel: CancelFlag) -> anyhow::Result<ScanOutcome> {
    scan_with_progress(root, options, cancel, None)
}

/// Start a scan on a dedicated thread and return a handle for progress,
/// cancellation and joining.
pub fn start_scan(root: PathBuf, options: ScanOptions) -> ScanHandle {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel_flag: CancelFlag = Arc::new(AtomicBool::new(false));
    let cancel_clone = cancel_flag.clone();

    let thread = thread::Builder::new()
        .name("duscope-scanner".into())
        .spawn(move || scan_with_progress(&root, &options, cancel_clone, Some(&progress_tx)))
        .expect("failed to spawn scanner thread");

    ScanHandle {
        progress_rx,
        cancel_flag,
        thread: Some(thread),
    }
}

/// Handle to a running scan. Allows cancellation, receiving progress
/// updates, and collecting the outcome.
pub struct ScanHandle {
    /// Receiver for progress updates from the scan thread.
    pub progress_rx: Receiver<ScanProgress>,
    cancel_flag: CancelFlag,
    thread: Option<thread::JoinHandle<anyhow::Result<ScanOutcome>>>,
}

impl ScanHandle {
    /// Request the scan to stop as soon as the current units finish.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// Block until the scan finishes and return its outcome.
    pub fn join(mut self) -> anyhow::Result<ScanOutcome> {
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| anyhow::anyhow!("scanner thread panicked"))?,
            None => bail!("scan already joined"),
        }
    }
}

fn scan_with_progress(
    root: &Path,
    options: &ScanOptions,
    cancel: CancelFlag,
    progress: Option<&Sender<ScanProgress>>,
) -> anyhow::Result<ScanOutcome> {
    let start = Instant::now();

    // The only fatal failure: the root itself cannot be opened.
    let root_meta = fs::metadata(root)
        .with_context(|| format!("cannot open scan root {}", root.display()))?;
    if !root_meta.is_dir() {
        bail!("scan root {} is not a directory", root.display());
    }
    let canonical_root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

    info!("starting scan of {}", root.display());

    // The root node's name holds the full root path, so reconstructed
    // paths are real filesystem paths.
    let mut root_node = FileNode::new_folder(
        CompactString::new(root.to_string_lossy()),
        root_meta.len(),
        platform::allocated_size(&root_meta),
        None,
    );
    root_node.mode = platform::mode_bits(&root_meta);
    root_node.modified = root_meta.modified().ok();
    let mut tree_builder = TreeBuilder::new(root.to_path_buf(), root_node);

    let (jobs_tx, jobs_rx) = crossbeam_channel::unbounded::<Job>();
    let (results_tx, results_rx) = crossbeam_channel::bounded::<ScanMessage>(RESULT_CHANNEL_CAPACITY);
    let pending = Arc::new(AtomicUsize::new(1));

    jobs_tx
        .send(Job::Walk(WalkUnit {
            dir: root.to_path_buf(),
            ancestors: Arc::new(vec![canonical_root]),
        }))
        .expect("job channel cannot be closed before workers start");

    let workers = options.worker_threads.max(1);
    let pool = WorkerPool::spawn(
        workers,
        jobs_tx,
        jobs_rx,
        results_tx,
        pending,
        cancel.clone(),
        options.compute_fingerprints,
    );

    // Collector: the workers' result senders are the only ones, so this
    // blocking loop ends exactly when the pool has drained and exited.
    let mut errors: Vec<ScanError> = Vec::new();
    let mut files_found: u64 = 0;
    let mut dirs_found: u64 = 1; // count the root
    let mut total_size: u64 = 0;
    let mut update_counter: u64 = 0;

    for message in results_rx.iter() {
        match message {
            ScanMessage::Entry { parent, node } => {
                update_counter += 1;
                if node.is_folder() {
                    dirs_found += 1;
                } else {
                    files_found += 1;
                    total_size += match options.metric {
                        SizeMetric::Apparent => node.size,
                        SizeMetric::OnDisk => node.allocated,
                    };
                }

                if update_counter % UPDATE_INTERVAL == 0 {
                    if let Some(tx) = progress {
                        // Stale updates are droppable; never block traversal.
                        let _ = tx.try_send(ScanProgress::Update {
                            files_found,
                            dirs_found,
                            total_size,
                            current_path: parent.to_string_lossy().into_owned(),
                        });
                    }
                }

                tree_builder.insert(&parent, node);
            }
            ScanMessage::Failure(error) => {
                if let ScanError::Io { path, .. } = &error {
                    tree_builder.mark_unreadable(path);
                }
                if let Some(tx) = progress {
                    let _ = tx.try_send(ScanProgress::Error {
                        error: error.clone(),
                    });
                }
                errors.push(error);
            }
        }
    }

    pool.join();

    let cancelled = cancel.load(Ordering::Relaxed);
    debug!(
        "walk complete: {} files, {} dirs, {} errors in {:?}; aggregating",
        files_found,
        dirs_found,
        errors.len(),
        start.elapsed()
    );

    let node_count = tree_builder.len();
    let tree = tree_builder.finish();
    let duration = start.elapsed();
    debug!("aggregation complete: {node_count} nodes, total {duration:?}");

    if let Some(tx) = progress {
        let message = if cancelled {
            ScanProgress::Cancelled
        } else {
            ScanProgress::Complete {
                duration,
                error_count: errors.len() as u64,
            }
        };
        let _ = tx.send(message);
    }

    Ok(ScanOutcome {
        tree,
        errors,
        cancelled,
        duration,
    })
}
