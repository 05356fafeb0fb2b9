//! Builder-style option types for backend-driven operations.

use crate::{Depth, RevisionRange};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
/// Options for [`crate::status`].
pub struct StatusOptions {
    /// Status depth.
    pub depth: Depth,
    /// Whether to report ignored nodes.
    pub include_ignored: bool,
    /// Whether to report unversioned nodes.
    pub include_unversioned: bool,
    /// Whether to look up tree-conflict detail the backend did not report
    /// inline (see [`crate::augment_conflicts`]).
    pub fetch_tree_conflicts: bool,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            depth: Depth::Infinity,
            include_ignored: false,
            include_unversioned: true,
            fetch_tree_conflicts: true,
        }
    }
}

impl StatusOptions {
    /// Creates status options for a depth.
    pub fn new(depth: Depth) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    /// Reports ignored nodes as well.
    #[must_use]
    pub fn with_ignored(mut self) -> Self {
        self.include_ignored = true;
        self
    }

    /// Skips unversioned nodes.
    #[must_use]
    pub fn without_unversioned(mut self) -> Self {
        self.include_unversioned = false;
        self
    }

    /// Returns the entries exactly as the backend reported them.
    #[must_use]
    pub fn without_tree_conflict_lookup(mut self) -> Self {
        self.fetch_tree_conflicts = false;
        self
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
/// Which revision properties to request for `log` operations.
pub enum LogRevProps {
    /// Request all revision properties.
    All,
    /// Request only a specific set of revision property names.
    Custom(Vec<String>),
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
/// Options for [`crate::log_entries`].
pub struct LogOptions {
    /// Revision ranges to report.
    pub ranges: Vec<RevisionRange>,
    /// Whether to include changed paths in each log entry.
    pub changed_paths: bool,
    /// Maximum number of top-level entries to return (`0` means unlimited).
    pub limit: u64,
    /// Whether to include merged revisions as nested merge groups.
    pub include_merged_revisions: bool,
    /// Which revision properties to request.
    pub revprops: LogRevProps,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            ranges: Vec::new(),
            changed_paths: true,
            limit: 0,
            include_merged_revisions: true,
            revprops: LogRevProps::All,
        }
    }
}

impl LogOptions {
    /// Convenience constructor for a single numeric range.
    pub fn between(start_rev: u64, end_rev: u64) -> Self {
        Self {
            ranges: vec![RevisionRange::between(start_rev, end_rev)],
            ..Self::default()
        }
    }

    /// Adds another revision range.
    #[must_use]
    pub fn with_range(mut self, range: RevisionRange) -> Self {
        self.ranges.push(range);
        self
    }

    /// Limits the number of top-level entries.
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Reports merged revisions as plain entries only.
    #[must_use]
    pub fn without_merged_revisions(mut self) -> Self {
        self.include_merged_revisions = false;
        self
    }

    /// Requests only the given revision properties.
    #[must_use]
    pub fn with_revprops(mut self, names: Vec<String>) -> Self {
        self.revprops = LogRevProps::Custom(names);
        self
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
/// Options for [`crate::ExternalsParser`].
pub struct ExternalsOptions {
    /// Whether local paths may contain quoted or backslash-escaped spaces.
    ///
    /// Backends older than the 1.6 API split definitions on whitespace only.
    pub allow_spaces_in_local_path: bool,
}

impl Default for ExternalsOptions {
    fn default() -> Self {
        Self {
            allow_spaces_in_local_path: true,
        }
    }
}

impl ExternalsOptions {
    /// Splits definitions on whitespace only.
    #[must_use]
    pub fn whitespace_only(mut self) -> Self {
        self.allow_spaces_in_local_path = false;
        self
    }
}
