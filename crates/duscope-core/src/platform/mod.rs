//! Platform-specific metadata extraction.
//!
//! On Unix the on-disk size comes from the block count reported by
//! `stat(2)` (512-byte units regardless of the filesystem block size).
//! Elsewhere the apparent length is the best available approximation.

use std::fs::Metadata;

/// Bytes actually allocated on storage for an entry.
#[cfg(unix)]
pub fn allocated_size(meta: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.blocks() * 512
}

/// Bytes actually allocated on storage for an entry.
#[cfg(not(unix))]
pub fn allocated_size(meta: &Metadata) -> u64 {
    meta.len()
}

/// Raw permission/type bits for an entry, 0 where the platform has none.
#[cfg(unix)]
pub fn mode_bits(meta: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    meta.mode()
}

/// Raw permission/type bits for an entry, 0 where the platform has none.
#[cfg(not(unix))]
pub fn mode_bits(_meta: &Metadata) -> u32 {
    0
}
