//! End-to-end scanner and navigator integration tests.
//!
//! These exercise the real worker pool against a real temporary
//! filesystem: thread spawning, job scheduling, cycle exclusion, arena
//! insertion, aggregation, and the navigator on top of a scanned tree —
//! with zero mocking.

use duscope_core::model::NodeIndex;
use duscope_core::scanner::progress::{ScanError, ScanProgress};
use duscope_core::{
    scan, start_scan, CancelFlag, FileTree, Navigator, ScanOptions, SizeMetric, ViewOptions,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Create a reproducible directory tree for scanner tests:
///
/// ```text
/// root/
///   alpha/
///     a.txt   (100 bytes)
///     b.rs    (200 bytes)
///   beta/
///     c.png   (300 bytes)
///   d.zip     (400 bytes)
/// ```
///
/// Total file bytes: 1 000.
fn build_test_tree(root: &Path) {
    let alpha = root.join("alpha");
    let beta = root.join("beta");
    fs::create_dir_all(&alpha).unwrap();
    fs::create_dir_all(&beta).unwrap();

    write_bytes(&alpha.join("a.txt"), 100);
    write_bytes(&alpha.join("b.rs"), 200);
    write_bytes(&beta.join("c.png"), 300);
    write_bytes(&root.join("d.zip"), 400);
}

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

fn no_cancel() -> CancelFlag {
    Arc::new(AtomicBool::new(false))
}

/// Every folder must satisfy `aggregate == own base + Σ children`, for
/// both metrics, and file counts must add up the same way.
fn assert_aggregation_invariant(tree: &FileTree) {
    for i in 0..tree.len() {
        let idx = NodeIndex::new(i);
        let node = tree.node(idx);
        if !node.is_folder() || node.is_detached {
            continue;
        }
        let children = tree.children(idx);
        let sum_size: u64 = children.iter().map(|c| tree.node(*c).size).sum();
        let sum_alloc: u64 = children.iter().map(|c| tree.node(*c).allocated).sum();
        assert_eq!(
            node.size,
            node.self_size + sum_size,
            "apparent-size invariant broken at {}",
            tree.full_path(idx).display()
        );
        assert_eq!(
            node.allocated,
            node.self_allocated + sum_alloc,
            "on-disk-size invariant broken at {}",
            tree.full_path(idx).display()
        );
    }
}

// ── Scanner ──────────────────────────────────────────────────────────────────

#[test]
fn scan_discovers_all_files_and_sums_sizes() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());

    let outcome = scan(tmp.path(), &ScanOptions::default(), no_cancel()).unwrap();
    assert!(!outcome.cancelled);
    assert!(outcome.errors.is_empty(), "unexpected errors: {:?}", outcome.errors);

    let tree = &outcome.tree;
    // 1 root + 2 dirs + 4 files.
    assert_eq!(tree.len(), 7);

    // Apparent total = 1000 file bytes + the directories' own base sizes.
    let dir_bases: u64 = (0..tree.len())
        .map(NodeIndex::new)
        .filter(|i| tree.node(*i).is_folder())
        .map(|i| tree.node(i).self_size)
        .sum();
    assert_eq!(tree.total(SizeMetric::Apparent), 1_000 + dir_bases);

    assert_aggregation_invariant(tree);
}

#[test]
fn scan_empty_directory_yields_bare_root() {
    let tmp = TempDir::new().expect("failed to create temp dir");

    let outcome = scan(tmp.path(), &ScanOptions::default(), no_cancel()).unwrap();
    let tree = &outcome.tree;
    assert_eq!(tree.len(), 1);
    assert!(tree.children(tree.root()).is_empty());
    // Nothing beyond the root's own directory-entry allocation.
    assert_eq!(tree.total(SizeMetric::Apparent), tree.node(tree.root()).self_size);
}

#[test]
fn scan_missing_root_is_fatal() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let missing = tmp.path().join("no-such-dir");
    let result = scan(&missing, &ScanOptions::default(), no_cancel());
    assert!(result.is_err());
}

#[test]
fn scan_file_root_is_fatal() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let file = tmp.path().join("just-a-file");
    write_bytes(&file, 10);
    let result = scan(&file, &ScanOptions::default(), no_cancel());
    assert!(result.is_err());
}

#[test]
fn single_worker_scan_matches_default() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());

    let narrow = ScanOptions {
        worker_threads: 1,
        ..ScanOptions::default()
    };
    let one = scan(tmp.path(), &narrow, no_cancel()).unwrap();
    let many = scan(tmp.path(), &ScanOptions::default(), no_cancel()).unwrap();

    assert_eq!(one.tree.len(), many.tree.len());
    assert_eq!(
        one.tree.total(SizeMetric::Apparent),
        many.tree.total(SizeMetric::Apparent)
    );
    assert_eq!(
        one.tree.total(SizeMetric::OnDisk),
        many.tree.total(SizeMetric::OnDisk)
    );
}

#[test]
fn pre_cancelled_scan_returns_partial_tree() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());

    let cancel = Arc::new(AtomicBool::new(true));
    let outcome = scan(tmp.path(), &ScanOptions::default(), cancel).unwrap();
    assert!(outcome.cancelled);
    // The root node always exists; skipped units mean nothing below it.
    assert!(outcome.tree.len() >= 1);
    assert_aggregation_invariant(&outcome.tree);
}

#[test]
fn cancel_flag_set_midway_still_terminates() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());

    let handle = start_scan(tmp.path().to_path_buf(), ScanOptions::default());
    handle.cancel();
    assert!(handle.is_cancelled());

    // May complete or be cancelled depending on timing; both must terminate
    // and return a coherent tree.
    let outcome = handle.join().unwrap();
    assert_aggregation_invariant(&outcome.tree);
}

#[test]
fn start_scan_reports_terminal_progress() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());

    let handle = start_scan(tmp.path().to_path_buf(), ScanOptions::default());
    let mut saw_terminal = false;
    while let Ok(message) = handle.progress_rx.recv_timeout(Duration::from_secs(30)) {
        match message {
            ScanProgress::Complete { error_count, .. } => {
                assert_eq!(error_count, 0);
                saw_terminal = true;
                break;
            }
            ScanProgress::Cancelled => panic!("scan was unexpectedly cancelled"),
            ScanProgress::Update { .. } | ScanProgress::Error { .. } => continue,
        }
    }
    assert!(saw_terminal, "no terminal progress message within 30 s");

    let outcome = handle.join().unwrap();
    assert_eq!(outcome.tree.len(), 7);
}

#[test]
fn fingerprints_present_only_when_enabled() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());

    let plain = scan(tmp.path(), &ScanOptions::default(), no_cancel()).unwrap();
    for i in 0..plain.tree.len() {
        assert!(plain.tree.node(NodeIndex::new(i)).fingerprint.is_none());
    }

    let options = ScanOptions {
        compute_fingerprints: true,
        ..ScanOptions::default()
    };
    let printed = scan(tmp.path(), &options, no_cancel()).unwrap();
    let fingerprinted = (0..printed.tree.len())
        .map(NodeIndex::new)
        .filter(|i| printed.tree.node(*i).fingerprint.is_some())
        .count();
    assert_eq!(fingerprinted, 4, "every file leaf gets a fingerprint");
}

#[cfg(unix)]
#[test]
fn symlink_to_ancestor_records_one_cycle_and_terminates() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());
    let loop_link = tmp.path().join("alpha").join("loop");
    std::os::unix::fs::symlink(tmp.path(), &loop_link).unwrap();

    let outcome = scan(tmp.path(), &ScanOptions::default(), no_cancel()).unwrap();

    let cycles: Vec<_> = outcome
        .errors
        .iter()
        .filter(|e| matches!(e, ScanError::CycleDetected { .. }))
        .collect();
    assert_eq!(cycles.len(), 1, "exactly one cycle for the loop entry");
    assert_eq!(cycles[0].path(), loop_link);

    // The skipped entry is still visible as a zero-size error leaf.
    let tree = &outcome.tree;
    let alpha = tree.child_named(tree.root(), "alpha").unwrap();
    let leaf = tree.child_named(alpha, "loop").expect("cycle leaf recorded");
    assert!(tree.node(leaf).is_error);
    assert_eq!(tree.node(leaf).size, 0);
    assert_aggregation_invariant(tree);
}

#[cfg(unix)]
#[test]
fn benign_symlink_is_counted_not_flagged() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());
    std::os::unix::fs::symlink(tmp.path().join("d.zip"), tmp.path().join("link-to-d")).unwrap();

    let outcome = scan(tmp.path(), &ScanOptions::default(), no_cancel()).unwrap();
    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);

    let tree = &outcome.tree;
    let link = tree.child_named(tree.root(), "link-to-d").unwrap();
    assert!(!tree.node(link).is_error);
    // The link itself is the entry — its target's 400 bytes are not
    // double-counted.
    assert!(tree.node(link).size < 400);
}

// ── Navigator over a scanned tree ────────────────────────────────────────────

#[test]
fn navigate_and_delete_scanned_tree() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());

    let outcome = scan(tmp.path(), &ScanOptions::default(), no_cancel()).unwrap();
    let mut nav = Navigator::new(outcome.tree, ViewOptions::default());

    // Folders precede files under the default options.
    let listing = nav.current_listing();
    assert_eq!(listing.len(), 3);
    assert!(listing[0].is_folder() && listing[1].is_folder());
    assert_eq!(listing[2].name, "d.zip");

    nav.enter("alpha").unwrap();
    assert_eq!(nav.current_path(), tmp.path().join("alpha"));
    assert_eq!(nav.current_listing().len(), 2);

    let requested = nav.delete("a.txt").unwrap();
    assert_eq!(requested, tmp.path().join("alpha").join("a.txt"));
    assert_eq!(nav.current_listing().len(), 1);
    assert_aggregation_invariant(nav.tree());

    // Deleting only mutates the in-memory tree; the file is still on disk
    // for the external collaborator to remove.
    assert!(requested.exists());

    assert!(nav.back());
    assert_eq!(nav.current_path(), tmp.path());
    assert!(!nav.back(), "back at root is a no-op");
}

#[test]
fn repeated_deletes_keep_both_metrics_consistent() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());

    let outcome = scan(tmp.path(), &ScanOptions::default(), no_cancel()).unwrap();
    let mut nav = Navigator::new(outcome.tree, ViewOptions::default());

    for victim in ["d.zip", "beta", "alpha"] {
        nav.delete(victim).unwrap();
        assert_aggregation_invariant(nav.tree());
    }
    assert!(nav.current_listing().is_empty());
    assert_eq!(
        nav.root_total(SizeMetric::Apparent),
        nav.tree().node(nav.tree().root()).self_size
    );
}
