//! Reconstruction of nested merge history from a flat log stream.
//!
//! With merged revisions requested, a backend reports a merge parent flagged
//! as having children, then the revisions it merged in (which may open nested
//! groups themselves), then a sentinel entry closing the group.

use tracing::{debug, trace};

use crate::{LogEntry, ReconcileError};

/// Receiver of a streamed `log` response, one entry at a time.
pub trait LogEntryHandler {
    /// Called for each reported entry, sentinels included.
    fn on_entry(&mut self, entry: LogEntry) -> Result<(), ReconcileError>;
}

impl<F> LogEntryHandler for F
where
    F: FnMut(LogEntry) -> Result<(), ReconcileError>,
{
    fn on_entry(&mut self, entry: LogEntry) -> Result<(), ReconcileError> {
        self(entry)
    }
}

/// Builds the merge tree incrementally.
///
/// Entries are fed with [`MergeTreeBuilder::next`]. Only
/// [`MergeTreeBuilder::finish`] checks that every merge group was closed, so
/// [`MergeTreeBuilder::entries`] may be incomplete while the stream is still
/// running.
///
/// ```
/// # use svn_reconcile::{LogEntry, MergeTreeBuilder};
/// let mut builder = MergeTreeBuilder::new();
/// builder.next(LogEntry::new(5).with_children());
/// builder.next(LogEntry::new(3));
/// builder.next(LogEntry::new(4));
/// builder.next(LogEntry::sentinel());
///
/// let entries = builder.finish()?;
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].rev, 5);
/// let children: Vec<u64> = entries[0].children().iter().map(|c| c.rev).collect();
/// assert_eq!(children, [3, 4]);
/// # Ok::<(), svn_reconcile::ReconcileError>(())
/// ```
#[derive(Debug, Default)]
pub struct MergeTreeBuilder {
    stack: Vec<LogEntry>,
    entries: Vec<LogEntry>,
    stray_terminators: usize,
}

impl MergeTreeBuilder {
    /// Creates an idle builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next entry of the stream.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self, entry: LogEntry) {
        if entry.is_sentinel() {
            self.close_group();
            return;
        }

        if entry.has_children() {
            debug!(rev = entry.rev, depth = self.stack.len() + 1, "merge group opened");
            self.stack.push(entry);
            return;
        }

        match self.stack.last_mut() {
            Some(parent) => {
                trace!(rev = entry.rev, parent = parent.rev, "merged revision");
                parent.push_child(entry);
            }
            None => self.entries.push(entry),
        }
    }

    fn close_group(&mut self) {
        let Some(group) = self.stack.pop() else {
            self.stray_terminators += 1;
            debug!(
                count = self.stray_terminators,
                "ignoring merge group terminator outside of a group"
            );
            return;
        };
        debug!(
            rev = group.rev,
            children = group.children().len(),
            depth = self.stack.len() + 1,
            "merge group closed"
        );
        match self.stack.last_mut() {
            Some(parent) => parent.push_child(group),
            None => self.entries.push(group),
        }
    }

    /// Number of merge groups currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether no merge group is open.
    pub fn is_idle(&self) -> bool {
        self.stack.is_empty()
    }

    /// Number of group terminators received while no group was open.
    ///
    /// These do not change the tree; callers wanting a strict stream can
    /// reject a non-zero count before calling [`MergeTreeBuilder::finish`].
    pub fn stray_terminators(&self) -> usize {
        self.stray_terminators
    }

    /// Top-level entries completed so far, in arrival order.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Ends the stream and returns the top-level entries.
    ///
    /// Fails with [`ReconcileError::TruncatedMergeGroup`] when a merge group
    /// was never closed; the revisions of the open groups are reported from
    /// the outermost inwards.
    pub fn finish(self) -> Result<Vec<LogEntry>, ReconcileError> {
        if !self.stack.is_empty() {
            let open_revisions: Vec<u64> = self.stack.iter().map(|group| group.rev).collect();
            debug!(?open_revisions, "log stream ended inside merge group");
            return Err(ReconcileError::TruncatedMergeGroup { open_revisions });
        }
        Ok(self.entries)
    }
}

impl LogEntryHandler for MergeTreeBuilder {
    fn on_entry(&mut self, entry: LogEntry) -> Result<(), ReconcileError> {
        self.next(entry);
        Ok(())
    }
}

/// Builds the merge tree of a complete log stream.
pub fn build_merge_tree<I>(stream: I) -> Result<Vec<LogEntry>, ReconcileError>
where
    I: IntoIterator<Item = LogEntry>,
{
    let mut builder = MergeTreeBuilder::new();
    for entry in stream {
        builder.next(entry);
    }
    builder.finish()
}
