//! Public data types consumed and produced by this crate.
//!
//! Most of these types mirror the records a Subversion backend reports for
//! `status`, `diff --summarize`, `info` and `log` queries.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, NaiveDateTime, Utc};

/// A Subversion property list (`name -> raw bytes`).
pub type PropertyList = BTreeMap<String, Vec<u8>>;

/// The kind of a node in the repository or working copy.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    /// No node exists at the requested path/revision.
    None,
    /// A file node.
    File,
    /// A directory node.
    Dir,
    /// An unknown kind (usually a forward-compatibility fallback).
    Unknown,
    /// A symbolic link.
    Symlink,
}

impl NodeKind {
    /// Parses a backend node-kind word; unrecognized words map to `Unknown`.
    pub fn from_word(word: &str) -> Self {
        match word {
            "none" => Self::None,
            "file" => Self::File,
            "dir" => Self::Dir,
            "symlink" => Self::Symlink,
            _ => Self::Unknown,
        }
    }

    /// Returns a stable string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::File => "file",
            Self::Dir => "dir",
            Self::Unknown => "unknown",
            Self::Symlink => "symlink",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subversion depth value used by `status` and `info` queries.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Depth {
    /// The target itself only.
    Empty,
    /// Include file children.
    Files,
    /// Include immediate children (files and dirs) but not recurse.
    Immediates,
    /// Fully recursive.
    Infinity,
}

impl Depth {
    /// Returns the word Subversion uses for this depth.
    pub fn as_word(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Files => "files",
            Self::Immediates => "immediates",
            Self::Infinity => "infinity",
        }
    }
}

/// Text or property status of a versioned node.
///
/// Variants only carry identity; the declaration order has no meaning.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum StatusKind {
    /// Does not exist.
    None,
    /// Exists, no local modifications.
    Normal,
    /// Locally modified.
    Modified,
    /// Scheduled for addition.
    Added,
    /// Scheduled for deletion.
    Deleted,
    /// Not under version control.
    Unversioned,
    /// Versioned but missing from disk.
    Missing,
    /// Deleted and re-added.
    Replaced,
    /// Merged with repository changes.
    Merged,
    /// In conflict.
    Conflicted,
    /// Obstructed by an item of a different kind.
    Obstructed,
    /// Ignored by `svn:ignore` or global ignores.
    Ignored,
    /// Directory that did not finish an update.
    Incomplete,
    /// Unversioned path populated by an externals definition.
    External,
}

impl StatusKind {
    /// Returns the single-letter code `svn status` prints for this kind.
    pub fn as_char(self) -> char {
        match self {
            Self::None | Self::Normal => ' ',
            Self::Modified => 'M',
            Self::Added => 'A',
            Self::Deleted => 'D',
            Self::Unversioned => '?',
            Self::Missing => '!',
            Self::Replaced => 'R',
            Self::Merged => 'G',
            Self::Conflicted => 'C',
            Self::Obstructed => '~',
            Self::Ignored => 'I',
            Self::Incomplete => '!',
            Self::External => 'X',
        }
    }
}

/// Which kind of conflict a [`TreeConflict`] describes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConflictKind {
    /// Conflicting file contents.
    Content,
    /// Conflicting properties.
    Properties,
    /// Structural (tree) conflict.
    Tree,
}

/// The incoming change that caused a conflict.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConflictAction {
    /// Incoming modification.
    Modify,
    /// Incoming addition.
    Add,
    /// Incoming deletion.
    Delete,
    /// Incoming replacement.
    Replace,
}

/// The local state that clashed with the incoming change.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConflictReason {
    /// Local modification.
    Modified,
    /// Local obstruction.
    Obstructed,
    /// Local deletion.
    Deleted,
    /// Missing locally.
    Missing,
    /// Unversioned item in the way.
    Unversioned,
    /// Local addition.
    Added,
    /// Local replacement.
    Replaced,
    /// The node was moved away locally.
    MovedAway,
    /// The node was moved here locally.
    MovedHere,
}

/// The operation during which a conflict was raised.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConflictOperation {
    /// Not recorded.
    None,
    /// `update`.
    Update,
    /// `switch`.
    Switch,
    /// `merge`.
    Merge,
}

/// Tree-conflict detail as returned by an `info` query.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeConflict {
    /// Working-copy path of the conflicted node.
    pub path: String,
    /// Conflict kind.
    pub kind: ConflictKind,
    /// Incoming action.
    pub action: ConflictAction,
    /// Local reason.
    pub reason: ConflictReason,
    /// Operation that raised the conflict.
    pub operation: ConflictOperation,
    /// Node kind of the conflicted node.
    pub node_kind: NodeKind,
}

/// A status or diff-summary record.
///
/// Everything except the tree-conflict detail is fixed at construction. The
/// detail is filled in at most once, by [`crate::augment_conflicts`], when the
/// backend flagged a conflict without reporting it inline.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathEntry {
    path_prev: String,
    path_next: Option<String>,
    node_kind: NodeKind,
    text_status: StatusKind,
    prop_status: StatusKind,
    has_conflict: bool,
    tree_conflicts: Option<Vec<TreeConflict>>,
}

impl PathEntry {
    /// Creates an entry for `path` with no property change and no conflict.
    pub fn new(path: impl Into<String>, node_kind: NodeKind, text_status: StatusKind) -> Self {
        Self {
            path_prev: path.into(),
            path_next: None,
            node_kind,
            text_status,
            prop_status: StatusKind::None,
            has_conflict: false,
            tree_conflicts: None,
        }
    }

    /// Sets the path on the other side of a two-sided diff.
    #[must_use]
    pub fn with_path_next(mut self, path: impl Into<String>) -> Self {
        self.path_next = Some(path.into());
        self
    }

    /// Sets the property status.
    #[must_use]
    pub fn with_prop_status(mut self, status: StatusKind) -> Self {
        self.prop_status = status;
        self
    }

    /// Marks the entry as conflicted, optionally with inline tree-conflict detail.
    #[must_use]
    pub fn with_conflict(mut self, tree_conflicts: Option<Vec<TreeConflict>>) -> Self {
        self.has_conflict = true;
        self.set_tree_conflicts(tree_conflicts.unwrap_or_default());
        self
    }

    /// The (old side) path this entry is reported for.
    pub fn path_prev(&self) -> &str {
        &self.path_prev
    }

    /// The new side path for two-sided diffs.
    pub fn path_next(&self) -> Option<&str> {
        self.path_next.as_deref()
    }

    /// Node kind.
    pub fn node_kind(&self) -> NodeKind {
        self.node_kind
    }

    /// Text status.
    pub fn text_status(&self) -> StatusKind {
        self.text_status
    }

    /// Property status.
    pub fn prop_status(&self) -> StatusKind {
        self.prop_status
    }

    /// Whether the backend flagged the node as conflicted.
    pub fn has_conflict(&self) -> bool {
        self.has_conflict
    }

    /// Tree-conflict detail, if known.
    pub fn tree_conflicts(&self) -> Option<&[TreeConflict]> {
        self.tree_conflicts.as_deref()
    }

    /// Whether this entry still needs a separate tree-conflict lookup.
    pub fn needs_conflict_detail(&self) -> bool {
        self.has_conflict && self.tree_conflicts.is_none()
    }

    /// Stores tree-conflict detail; an empty list is kept as "unknown".
    pub(crate) fn set_tree_conflicts(&mut self, tree_conflicts: Vec<TreeConflict>) {
        self.tree_conflicts = if tree_conflicts.is_empty() {
            None
        } else {
            Some(tree_conflicts)
        };
    }
}

/// Result of an `info` query for one node.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryInfo {
    /// Working-copy path.
    pub path: String,
    /// Repository URL, if the node is versioned.
    pub url: Option<String>,
    /// Node kind.
    pub node_kind: NodeKind,
    /// Base revision, if known.
    pub revision: Option<u64>,
    /// Tree conflicts recorded on the node.
    pub tree_conflicts: Vec<TreeConflict>,
}

/// A single path change entry within a [`LogEntry`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangedPath {
    /// Change action (usually `A`, `D`, `M`, `R`).
    pub action: String,
    /// Changed repository path.
    pub path: String,
    /// Copy source path, if this change was made by a copy.
    pub copy_from_path: Option<String>,
    /// Copy source revision, if this change was made by a copy.
    pub copy_from_rev: Option<u64>,
    /// Node kind, if provided by the backend.
    pub node_kind: Option<NodeKind>,
}

/// A log entry as reported by a `log` query.
///
/// When the query includes merged revisions, entries with children open a
/// merge group and the backend closes it with an entry whose
/// `invalid_revnum` flag is set. [`crate::MergeTreeBuilder`] turns that flat
/// stream into a tree: the merge parent keeps its own revision and changed
/// paths, and `children` holds the revisions it merged in.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// Revision number (meaningless when `invalid_revnum` is set).
    pub rev: u64,
    /// Changed paths list (may be empty if not requested).
    pub changed_paths: Vec<ChangedPath>,
    /// Author, if provided.
    pub author: Option<String>,
    /// Date, if provided.
    pub date: Option<String>,
    /// Commit message, if provided.
    pub message: Option<String>,
    /// Additional revision properties.
    pub rev_props: PropertyList,
    /// Whether this entry marks the end of a merged-revision subtree.
    pub invalid_revnum: bool,
    /// Whether this entry represents a subtractive merge.
    pub subtractive_merge: bool,
    children: Option<Vec<LogEntry>>,
}

impl LogEntry {
    /// Creates a plain entry for `rev`.
    pub fn new(rev: u64) -> Self {
        Self {
            rev,
            changed_paths: Vec::new(),
            author: None,
            date: None,
            message: None,
            rev_props: PropertyList::new(),
            invalid_revnum: false,
            subtractive_merge: false,
            children: None,
        }
    }

    /// Creates the end-of-merge-group marker.
    pub fn sentinel() -> Self {
        Self {
            invalid_revnum: true,
            ..Self::new(0)
        }
    }

    /// Flags this entry as a merge parent that will receive children.
    #[must_use]
    pub fn with_children(mut self) -> Self {
        self.children.get_or_insert_with(Vec::new);
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Sets the date string.
    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Sets the commit message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a revision property.
    #[must_use]
    pub fn with_rev_prop(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.rev_props.insert(name.into(), value.into());
        self
    }

    /// Marks the entry as merged in reverse.
    #[must_use]
    pub fn with_subtractive_merge(mut self) -> Self {
        self.subtractive_merge = true;
        self
    }

    /// Returns a revision property as text, if present and valid UTF-8.
    pub fn rev_prop(&self, name: &str) -> Option<&str> {
        self.rev_props
            .get(name)
            .and_then(|value| std::str::from_utf8(value).ok())
    }

    /// Whether this is the end-of-merge-group marker.
    pub fn is_sentinel(&self) -> bool {
        self.invalid_revnum
    }

    /// Whether this entry was flagged as a merge parent.
    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }

    /// Merged-in revisions, in arrival order.
    pub fn children(&self) -> &[LogEntry] {
        self.children.as_deref().unwrap_or_default()
    }

    pub(crate) fn push_child(&mut self, child: LogEntry) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }

    /// Parses `date` as a UTC timestamp.
    ///
    /// Accepts RFC 3339 and Subversion's `YYYY-MM-DDTHH:MM:SS.ffffffZ` form.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let date = self.date.as_deref()?.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(date.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
