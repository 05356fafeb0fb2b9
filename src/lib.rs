//! Reconciliation of Subversion status, diff and log results.
//!
//! This crate takes the flat records a Subversion backend reports and turns
//! them into result sets that are safe to apply or display. It does not talk
//! to a repository itself: queries go through the [`RepositoryBackend`] trait.
//!
//! - [`reorder_diff`] orders change sets so parents are created before their
//!   children and deletions are applied before additions at the same path.
//! - [`MergeTreeBuilder`] rebuilds nested merge history from a flat,
//!   sentinel-terminated log stream.
//! - [`augment_conflicts`] fetches tree-conflict detail the status query did
//!   not report inline.
//! - [`ExternalsParser`] reads both `svn:externals` syntaxes.
//! - [`encode_url`]/[`decode_url`]/[`normalize_url`] handle repository URLs.
//! - [`shrink_to_roots`]/[`common_ancestor`] operate on sets of paths.
//!
//! ## Getting started
//!
//! ```rust
//! use svn_reconcile::{build_merge_tree, reorder_diff, LogEntry, NodeKind, PathEntry, StatusKind};
//!
//! fn main() -> svn_reconcile::Result<()> {
//!     let mut changes = vec![
//!         PathEntry::new("/trunk/lib", NodeKind::Dir, StatusKind::Added),
//!         PathEntry::new("/trunk", NodeKind::Dir, StatusKind::Added),
//!     ];
//!     reorder_diff(&mut changes, true);
//!     assert_eq!(changes[0].path_prev(), "/trunk");
//!
//!     let history = build_merge_tree([
//!         LogEntry::new(12).with_children(),
//!         LogEntry::new(9),
//!         LogEntry::sentinel(),
//!     ])?;
//!     assert_eq!(history[0].children()[0].rev, 9);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `serde`: enables `Serialize`/`Deserialize` for public data types.
//!
//! ## Shared state
//!
//! The only state shared between calls is the [`PatternCache`] of compiled
//! regular expressions. It is an ordinary value: clone it to share it.

#![deny(unsafe_code)]

mod aggregate;
mod backend;
mod error;
mod externals;
mod merge_tree;
mod options;
mod path;
mod pattern;
mod reorder;
mod revision;
mod types;
pub mod url;

pub use aggregate::{AugmentSummary, augment_conflicts, log_entries, status};
pub use backend::{Cancellation, NeverCancelled, RepositoryBackend};
pub use error::{BackendError, BackendErrorItem, ReconcileError};
/// Convenience alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, ReconcileError>;
pub use externals::{
    ExternalReference, ExternalsParser, ResolvedExternal, parse_externals, resolve_externals,
    serialize_externals,
};
pub use merge_tree::{LogEntryHandler, MergeTreeBuilder, build_merge_tree};
pub use options::{ExternalsOptions, LogOptions, LogRevProps, StatusOptions};
pub use path::{
    canonicalize_dir_path, canonicalize_path, common_ancestor, common_ancestors, is_prefix_of,
    parent, path_nodes, shrink_to_roots,
};
pub use pattern::{DEFAULT_PATTERN_CAPACITY, PatternCache, format_resource_name};
pub use reorder::{reorder_diff, reorder_paths, reorder_status};
pub use revision::{Revision, RevisionRange};
pub use types::{
    ChangedPath, ConflictAction, ConflictKind, ConflictOperation, ConflictReason, Depth,
    EntryInfo, LogEntry, NodeKind, PathEntry, PropertyList, StatusKind, TreeConflict,
};
pub use url::{RepositoryUrl, decode_url, encode_url, normalize_url};
