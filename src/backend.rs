//! Seams to the version-control connector and to the caller's progress
//! reporting.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    BackendError, Depth, EntryInfo, LogEntryHandler, LogOptions, PathEntry, ReconcileError,
    StatusOptions,
};

/// A connector able to answer status, info and log queries.
///
/// Implementations perform blocking calls; nothing in this crate retries a
/// failed query.
pub trait RepositoryBackend {
    /// Reports the status of `path` and its descendants down to `options.depth`.
    fn status(
        &mut self,
        path: &str,
        options: &StatusOptions,
    ) -> Result<Vec<PathEntry>, BackendError>;

    /// Reports entry information for `path`.
    fn info(&mut self, path: &str, depth: Depth) -> Result<Vec<EntryInfo>, BackendError>;

    /// Streams the history of `path` into `handler`.
    ///
    /// With `options.include_merged_revisions`, merge groups are opened by an
    /// entry flagged with children and closed by a sentinel entry.
    fn log(
        &mut self,
        path: &str,
        options: &LogOptions,
        handler: &mut dyn LogEntryHandler,
    ) -> Result<(), ReconcileError>;
}

/// Cooperative cancellation, polled between backend queries.
pub trait Cancellation {
    /// Whether the caller asked to stop issuing queries.
    fn is_cancelled(&self) -> bool;
}

impl Cancellation for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<C: Cancellation + ?Sized> Cancellation for &C {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// A [`Cancellation`] that never fires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeverCancelled;

impl Cancellation for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}
