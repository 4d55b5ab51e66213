//! Bounded worker pool for directory traversal.
//!
//! A fixed number of OS threads (independent of directory fan-out) pull
//! whole-directory units from a shared job channel, list each directory in
//! full, emit entry messages to the collector, and schedule discovered
//! subdirectories as new units. Peak memory and open-descriptor count are
//! bounded by the pool size, not by tree width or depth.
//!
//! # Completion
//!
//! An atomic outstanding-unit counter is incremented when a unit is
//! scheduled and decremented exactly once when it finishes. The worker that
//! drops the counter to zero sends a single shutdown token into the job
//! channel; each worker that receives the token forwards it before exiting,
//! so the whole pool drains without any polling loop. Every wait in the
//! pipeline is a blocking channel `recv`.
//!
//! # Cycles
//!
//! Each unit carries the canonical paths of the directory and all its
//! ancestors. A symlink or directory whose canonical target is already on
//! that chain would re-enter the traversal, so it is recorded as a
//! `CycleDetected` error leaf and never scheduled.

use crate::model::{DirEntryKind, FileNode};
use crate::platform;
use crate::scanner::fingerprint::metadata_fingerprint;
use crate::scanner::progress::ScanError;
use compact_str::CompactString;
use crossbeam_channel::{Receiver, Sender};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// One schedulable traversal unit: a single directory listing.
pub(crate) struct WalkUnit {
    pub dir: PathBuf,
    /// Canonical path of `dir` and of every ancestor up to the scan root.
    pub ancestors: Arc<Vec<PathBuf>>,
}

/// Messages on the job channel.
pub(crate) enum Job {
    Walk(WalkUnit),
    /// Drain token: forward once, then exit.
    Shutdown,
}

/// Messages sent from workers to the collector thread.
pub(crate) enum ScanMessage {
    /// A discovered entry, tagged with the path of its parent directory.
    Entry { parent: PathBuf, node: FileNode },
    /// A recorded non-fatal error.
    Failure(ScanError),
}

/// Shared state handed to every worker thread.
#[derive(Clone)]
struct Worker {
    jobs_rx: Receiver<Job>,
    jobs_tx: Sender<Job>,
    results_tx: Sender<ScanMessage>,
    /// Outstanding traversal units. Reaching zero ends the scan.
    pending: Arc<AtomicUsize>,
    cancel: Arc<AtomicBool>,
    compute_fingerprints: bool,
}

/// Handle to the spawned pool; joined after the result channel closes.
pub(crate) struct WorkerPool {
    handles: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` traversal threads.
    ///
    /// `pending` must already count the units seeded into the job channel.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        workers: usize,
        jobs_tx: Sender<Job>,
        jobs_rx: Receiver<Job>,
        results_tx: Sender<ScanMessage>,
        pending: Arc<AtomicUsize>,
        cancel: Arc<AtomicBool>,
        compute_fingerprints: bool,
    ) -> Self {
        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let worker = Worker {
                jobs_rx: jobs_rx.clone(),
                jobs_tx: jobs_tx.clone(),
                results_tx: results_tx.clone(),
                pending: pending.clone(),
                cancel: cancel.clone(),
                compute_fingerprints,
            };
            let handle = thread::Builder::new()
                .name(format!("duscope-scan-{i}"))
                .spawn(move || worker.run())
                .expect("failed to spawn scanner worker thread");
            handles.push(handle);
        }
        Self { handles }
    }

    /// Wait for every worker to exit.
    pub fn join(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

impl Worker {
    fn run(self) {
        while let Ok(job) = self.jobs_rx.recv() {
            match job {
                Job::Shutdown => {
                    let _ = self.jobs_tx.send(Job::Shutdown);
                    break;
                }
                Job::Walk(unit) => {
                    // A cancelled scan skips whole units; a unit already in
                    // progress always finishes, so no half-written folders
                    // ever reach the builder.
                    if !self.cancel.load(Ordering::Relaxed) {
                        self.walk_unit(&unit);
                    }
                    if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
                        let _ = self.jobs_tx.send(Job::Shutdown);
                    }
                }
            }
        }
    }

    /// List one directory in full: files become leaf messages, readable
    /// subdirectories are recorded and scheduled, failures become error
    /// leaves. Never aborts the scan.
    fn walk_unit(&self, unit: &WalkUnit) {
        let entries = match fs::read_dir(&unit.dir) {
            Ok(entries) => entries,
            Err(err) => {
                // The folder node already exists (it was discovered by its
                // parent's unit); the collector flags it unreadable.
                self.fail(ScanError::Io {
                    path: unit.dir.clone(),
                    message: err.to_string(),
                });
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.fail(ScanError::Io {
                        path: unit.dir.clone(),
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            let name = CompactString::new(entry.file_name().to_string_lossy());
            let path = unit.dir.join(entry.file_name());

            // DirEntry::metadata does not traverse symlinks, so symlinked
            // directories arrive here as symlink leaves, not folders.
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(err) => {
                    self.emit(&unit.dir, FileNode::new_error(name, DirEntryKind::File, None));
                    self.fail(ScanError::Io {
                        path,
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            let file_type = meta.file_type();
            if file_type.is_symlink() {
                match fs::canonicalize(&path) {
                    Ok(target) if unit.ancestors.contains(&target) => {
                        self.emit(&unit.dir, FileNode::new_error(name, DirEntryKind::Symlink, None));
                        self.fail(ScanError::CycleDetected { path });
                    }
                    _ => {
                        // Dangling targets are fine: the link itself is the entry.
                        let mut node = FileNode::new_leaf(
                            name,
                            DirEntryKind::Symlink,
                            meta.len(),
                            platform::allocated_size(&meta),
                            None,
                        );
                        node.mode = platform::mode_bits(&meta);
                        node.modified = meta.modified().ok();
                        self.emit(&unit.dir, node);
                    }
                }
            } else if file_type.is_dir() {
                let canonical = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
                if unit.ancestors.contains(&canonical) {
                    // Bind mount or similar re-entering an ancestor.
                    self.emit(&unit.dir, FileNode::new_error(name, DirEntryKind::Folder, None));
                    self.fail(ScanError::CycleDetected { path });
                    continue;
                }

                let mut node = FileNode::new_folder(
                    name,
                    meta.len(),
                    platform::allocated_size(&meta),
                    None,
                );
                node.mode = platform::mode_bits(&meta);
                node.modified = meta.modified().ok();
                // Emit before scheduling so the collector always links a
                // folder before any of that folder's own entries arrive.
                self.emit(&unit.dir, node);

                let mut chain = Vec::with_capacity(unit.ancestors.len() + 1);
                chain.extend_from_slice(&unit.ancestors);
                chain.push(canonical);
                self.pending.fetch_add(1, Ordering::AcqRel);
                let _ = self.jobs_tx.send(Job::Walk(WalkUnit {
                    dir: path,
                    ancestors: Arc::new(chain),
                }));
            } else {
                let mut node = FileNode::new_leaf(
                    name.clone(),
                    DirEntryKind::File,
                    meta.len(),
                    platform::allocated_size(&meta),
                    None,
                );
                node.mode = platform::mode_bits(&meta);
                node.modified = meta.modified().ok();
                if self.compute_fingerprints {
                    node.fingerprint =
                        Some(metadata_fingerprint(&name, meta.len(), node.modified));
                }
                self.emit(&unit.dir, node);
            }
        }
    }

    fn emit(&self, parent: &std::path::Path, node: FileNode) {
        let _ = self.results_tx.send(ScanMessage::Entry {
            parent: parent.to_path_buf(),
            node,
        });
    }

    fn fail(&self, error: ScanError) {
        let _ = self.results_tx.send(ScanMessage::Failure(error));
    }
}
