//! Size metrics and human-readable formatting.
//!
//! All internal sizes are `u64` bytes. Floating point is only used
//! at the display-formatting boundary.

use std::fmt;

/// Which size a view reports for every entry.
///
/// Both metrics are captured during the scan, so switching is O(1) and
/// never touches the filesystem again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizeMetric {
    /// Size as reported by file length.
    Apparent,
    /// Size as actually allocated on storage (allocation-unit rounded).
    #[default]
    OnDisk,
}

impl fmt::Display for SizeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeMetric::Apparent => write!(f, "apparent"),
            SizeMetric::OnDisk => write!(f, "disk usage"),
        }
    }
}

/// Format a byte count into a human-readable string with appropriate unit.
///
/// Uses binary units (KiB = 1024) but labels them with common short forms
/// (KB, MB, GB, TB) because that is what users expect in a disk tool.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    const TB: f64 = GB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else if b < TB {
        format!("{:.2} GB", b / GB)
    } else {
        format!("{:.2} TB", b / TB)
    }
}

/// Format an item count with thousand separators, for the item-count column.
pub fn format_count(count: u64) -> String {
    if count < 1_000 {
        return count.to_string();
    }
    let s = count.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}
