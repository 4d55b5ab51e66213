//! View configuration for the navigator.
//!
//! One immutable value constructed with the navigator and updated only
//! through its setters; every option takes effect on the next listing
//! query and never mutates the tree.

use crate::model::SizeMetric;
use std::fmt;

/// Primary listing sort key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Lexicographic by entry name.
    Name,
    /// By aggregated size under the active metric.
    #[default]
    Size,
    /// By last-modified time.
    ModTime,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Name => write!(f, "name"),
            SortKey::Size => write!(f, "size"),
            SortKey::ModTime => write!(f, "modify"),
        }
    }
}

/// How listings are ordered and filtered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewOptions {
    pub sort_key: SortKey,
    /// Reverses the primary key only; the name tie-break stays ascending.
    pub descending: bool,
    /// Group all folders before all files.
    pub directories_first: bool,
    /// Show dot-entries. Hidden entries still count toward folder sizes;
    /// the filter is display-only.
    pub show_hidden: bool,
    /// Active size metric for listings and fractions.
    pub metric: SizeMetric,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            sort_key: SortKey::Size,
            descending: true,
            directories_first: true,
            show_hidden: true,
            metric: SizeMetric::default(),
        }
    }
}
