//! Optional per-node metadata fingerprints.
//!
//! Off by default. When enabled via
//! [`ScanOptions::compute_fingerprints`](super::ScanOptions), every file
//! leaf carries a 64-bit hash of its name, size and modification time —
//! enough for a future re-scan diff without reading file contents.

use metrohash::MetroHash64;
use std::hash::Hasher;
use std::time::{SystemTime, UNIX_EPOCH};

/// Hash a file's identifying metadata into a stable 64-bit fingerprint.
pub fn metadata_fingerprint(name: &str, size: u64, modified: Option<SystemTime>) -> u64 {
    let mut hasher = MetroHash64::default();
    hasher.write(name.as_bytes());
    hasher.write_u64(size);
    if let Some(mtime) = modified {
        if let Ok(since_epoch) = mtime.duration_since(UNIX_EPOCH) {
            hasher.write_u64(since_epoch.as_secs());
            hasher.write_u32(since_epoch.subsec_nanos());
        }
    }
    hasher.finish()
}
