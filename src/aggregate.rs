//! Backend-driven status and log aggregation.

use tracing::debug;

use crate::path::canonicalize_path;
use crate::{
    Cancellation, Depth, LogEntry, LogOptions, MergeTreeBuilder, PathEntry, ReconcileError,
    RepositoryBackend, StatusOptions,
};

/// Outcome of [`augment_conflicts`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AugmentSummary {
    /// Number of info queries issued.
    pub queried: usize,
    /// Whether the pass stopped early because of cancellation.
    pub cancelled: bool,
}

/// Fills in tree-conflict detail the status query did not report inline.
///
/// Exactly one info query is issued for each conflicted entry without
/// tree-conflict detail; entries that already carry detail are never queried.
/// Cancellation is checked before every query. A failed query stops the pass
/// and is returned, entries processed before it keep their detail.
pub fn augment_conflicts<B, C>(
    backend: &mut B,
    entries: &mut [PathEntry],
    cancel: &C,
) -> Result<AugmentSummary, ReconcileError>
where
    B: RepositoryBackend + ?Sized,
    C: Cancellation + ?Sized,
{
    let mut summary = AugmentSummary::default();
    for entry in entries.iter_mut() {
        if !entry.needs_conflict_detail() {
            continue;
        }
        if cancel.is_cancelled() {
            debug!(queried = summary.queried, "tree conflict lookup cancelled");
            summary.cancelled = true;
            break;
        }

        let path = entry.path_prev().to_string();
        debug!(path = %path, "fetching tree conflict detail");
        let infos = backend
            .info(&path, Depth::Empty)
            .map_err(|err| err.with_context(format!("tree conflict lookup for '{path}'")))?;
        summary.queried += 1;

        let conflicts = infos
            .into_iter()
            .flat_map(|info| info.tree_conflicts)
            .collect::<Vec<_>>();
        debug!(path = %path, count = conflicts.len(), "tree conflict detail fetched");
        entry.set_tree_conflicts(conflicts);
    }
    Ok(summary)
}

/// Runs a status query and completes its tree-conflict detail.
///
/// When cancelled, the entries are returned as far as they were completed.
pub fn status<B, C>(
    backend: &mut B,
    path: &str,
    options: &StatusOptions,
    cancel: &C,
) -> Result<Vec<PathEntry>, ReconcileError>
where
    B: RepositoryBackend + ?Sized,
    C: Cancellation + ?Sized,
{
    let path = canonicalize_path(path)?;
    let mut entries = backend.status(&path, options)?;
    debug!(path = %path, count = entries.len(), "status reported");
    if options.fetch_tree_conflicts {
        augment_conflicts(backend, &mut entries, cancel)?;
    }
    Ok(entries)
}

/// Runs a log query and returns its top-level entries with merge groups
/// nested under their merge parents.
pub fn log_entries<B>(
    backend: &mut B,
    path: &str,
    options: &LogOptions,
) -> Result<Vec<LogEntry>, ReconcileError>
where
    B: RepositoryBackend + ?Sized,
{
    let path = canonicalize_path(path)?;
    let mut builder = MergeTreeBuilder::new();
    backend.log(&path, options, &mut builder)?;
    let entries = builder.finish()?;
    debug!(path = %path, count = entries.len(), "log reported");
    Ok(entries)
}
