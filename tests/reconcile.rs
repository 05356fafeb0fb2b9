//! End-to-end reconciliation against an in-memory backend.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use svn_reconcile::{
    BackendError, ConflictAction, ConflictKind, ConflictOperation, ConflictReason, Depth,
    EntryInfo, LogEntry, LogEntryHandler, LogOptions, LogRevProps, NeverCancelled, NodeKind,
    PathEntry, ReconcileError, RepositoryBackend, Revision, StatusKind, StatusOptions,
    TreeConflict, log_entries, reorder_status, resolve_externals, shrink_to_roots, status,
};

#[derive(Default)]
struct MemoryBackend {
    statuses: Vec<PathEntry>,
    infos: HashMap<String, EntryInfo>,
    log: Vec<LogEntry>,
    info_queries: Vec<String>,
    cancel_after_first_info: Option<Arc<AtomicBool>>,
}

impl RepositoryBackend for MemoryBackend {
    fn status(
        &mut self,
        path: &str,
        options: &StatusOptions,
    ) -> Result<Vec<PathEntry>, BackendError> {
        if path != "/wc" {
            return Err(BackendError::new(155007, format!("'{path}' is not a working copy")));
        }
        Ok(self
            .statuses
            .iter()
            .filter(|e| options.include_unversioned || e.text_status() != StatusKind::Unversioned)
            .cloned()
            .collect())
    }

    fn info(&mut self, path: &str, depth: Depth) -> Result<Vec<EntryInfo>, BackendError> {
        assert_eq!(depth, Depth::Empty);
        self.info_queries.push(path.to_string());
        if let Some(flag) = &self.cancel_after_first_info {
            flag.store(true, Ordering::SeqCst);
        }
        match self.infos.get(path) {
            Some(info) => Ok(vec![info.clone()]),
            None => Err(BackendError::new(155010, format!("the node '{path}' was not found"))),
        }
    }

    fn log(
        &mut self,
        _path: &str,
        options: &LogOptions,
        handler: &mut dyn LogEntryHandler,
    ) -> Result<(), ReconcileError> {
        for entry in &self.log {
            if !options.include_merged_revisions && (entry.is_sentinel() || entry.has_children()) {
                if entry.has_children() {
                    handler.on_entry(LogEntry::new(entry.rev))?;
                }
                continue;
            }
            let mut entry = entry.clone();
            if let LogRevProps::Custom(names) = &options.revprops {
                entry.rev_props.retain(|name, _| names.contains(name));
            }
            handler.on_entry(entry)?;
        }
        Ok(())
    }
}

fn tree_conflict(path: &str) -> TreeConflict {
    TreeConflict {
        path: path.to_string(),
        kind: ConflictKind::Tree,
        action: ConflictAction::Delete,
        reason: ConflictReason::Modified,
        operation: ConflictOperation::Update,
        node_kind: NodeKind::Dir,
    }
}

fn conflicted_info(path: &str) -> EntryInfo {
    EntryInfo {
        path: path.to_string(),
        url: Some(format!("svn://example.com/repo/trunk{}", &path[3..])),
        node_kind: NodeKind::Dir,
        revision: Some(41),
        tree_conflicts: vec![tree_conflict(path)],
    }
}

fn working_copy() -> MemoryBackend {
    let mut backend = MemoryBackend {
        statuses: vec![
            PathEntry::new("/wc/src", NodeKind::Dir, StatusKind::Conflicted).with_conflict(None),
            PathEntry::new("/wc", NodeKind::Dir, StatusKind::Normal),
            PathEntry::new("/wc/docs", NodeKind::Dir, StatusKind::Conflicted)
                .with_conflict(Some(vec![tree_conflict("/wc/docs")])),
            PathEntry::new("/wc/build.log", NodeKind::File, StatusKind::Unversioned),
            PathEntry::new("/wc/lib", NodeKind::Dir, StatusKind::Conflicted).with_conflict(None),
        ],
        ..MemoryBackend::default()
    };
    for path in ["/wc/src", "/wc/lib"] {
        backend.infos.insert(path.to_string(), conflicted_info(path));
    }
    backend
}

#[test]
fn status_fills_missing_tree_conflicts_once() {
    let mut backend = working_copy();
    let mut entries = status(&mut backend, "/wc/", &StatusOptions::default(), &NeverCancelled).unwrap();

    assert_eq!(backend.info_queries, ["/wc/src", "/wc/lib"]);
    assert!(entries.iter().all(|e| !e.needs_conflict_detail()));

    reorder_status(&mut entries, true);
    let paths: Vec<_> = entries.iter().map(PathEntry::path_prev).collect();
    assert_eq!(paths, ["/wc", "/wc/build.log", "/wc/docs", "/wc/lib", "/wc/src"]);

    let lib = entries.iter().find(|e| e.path_prev() == "/wc/lib").unwrap();
    assert_eq!(lib.tree_conflicts().unwrap(), [tree_conflict("/wc/lib")]);
}

#[test]
fn status_honors_unversioned_option() {
    let mut backend = working_copy();
    let options = StatusOptions::new(Depth::Infinity).without_unversioned();
    let entries = status(&mut backend, "/wc", &options, &NeverCancelled).unwrap();
    assert_eq!(entries.len(), 4);
}

#[test]
fn status_propagates_backend_failure() {
    let mut backend = working_copy();
    let err = status(&mut backend, "/elsewhere", &StatusOptions::default(), &NeverCancelled)
        .unwrap_err();
    match err {
        ReconcileError::Backend(err) => assert_eq!(err.chain[0].code, 155007),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_info_fails_fast_without_rollback() {
    let mut backend = working_copy();
    backend.infos.remove("/wc/lib");
    let err = status(&mut backend, "/wc", &StatusOptions::default(), &NeverCancelled).unwrap_err();

    let ReconcileError::Backend(err) = err else {
        panic!("expected backend error");
    };
    assert_eq!(err.context.as_deref(), Some("tree conflict lookup for '/wc/lib'"));
    assert!(err.to_string().contains("the node '/wc/lib' was not found"));
    assert_eq!(backend.info_queries, ["/wc/src", "/wc/lib"]);
}

#[test]
fn cancellation_is_checked_between_queries() {
    let cancel = Arc::new(AtomicBool::new(false));
    let mut backend = working_copy();
    backend.cancel_after_first_info = Some(cancel.clone());

    let entries = status(&mut backend, "/wc", &StatusOptions::default(), &*cancel).unwrap();

    assert_eq!(backend.info_queries, ["/wc/src"]);
    let pending: Vec<_> = entries
        .iter()
        .filter(|e| e.needs_conflict_detail())
        .map(PathEntry::path_prev)
        .collect();
    assert_eq!(pending, ["/wc/lib"]);
}

fn merge_history() -> Vec<LogEntry> {
    vec![
        LogEntry::new(20).with_author("alice").with_date("2024-03-01T10:00:00.000000Z"),
        LogEntry::new(19).with_children().with_message("merge feature"),
        LogEntry::new(15)
            .with_rev_prop("svn:author", "bob")
            .with_rev_prop("ci:build", "ok"),
        LogEntry::new(14).with_children().with_subtractive_merge(),
        LogEntry::new(11),
        LogEntry::sentinel(),
        LogEntry::new(13),
        LogEntry::sentinel(),
        LogEntry::new(18),
    ]
}

#[test]
fn log_nests_merged_revisions() {
    let mut backend = MemoryBackend {
        log: merge_history(),
        ..MemoryBackend::default()
    };
    let entries = log_entries(&mut backend, "/wc", &LogOptions::between(20, 1)).unwrap();

    let top: Vec<u64> = entries.iter().map(|e| e.rev).collect();
    assert_eq!(top, [20, 19, 18]);
    assert!(entries[0].timestamp().is_some());

    let merge = &entries[1];
    let merged: Vec<u64> = merge.children().iter().map(|e| e.rev).collect();
    assert_eq!(merged, [15, 14, 13]);
    assert_eq!(merge.children()[1].children()[0].rev, 11);
}

#[test]
fn log_keeps_requested_rev_props_and_reverse_merges() {
    let mut backend = MemoryBackend {
        log: merge_history(),
        ..MemoryBackend::default()
    };
    let options = LogOptions::between(20, 1).with_revprops(vec!["svn:author".to_string()]);
    let entries = log_entries(&mut backend, "/wc", &options).unwrap();

    let merged = entries[1].children();
    assert_eq!(merged[0].rev, 15);
    assert_eq!(merged[0].rev_prop("svn:author"), Some("bob"));
    assert_eq!(merged[0].rev_prop("ci:build"), None);
    assert_eq!(merged[1].rev, 14);
    assert!(merged[1].subtractive_merge);
    assert!(!merged[0].subtractive_merge);
}

#[test]
fn log_without_merged_revisions_is_flat() {
    let mut backend = MemoryBackend {
        log: merge_history(),
        ..MemoryBackend::default()
    };
    let options = LogOptions::between(20, 1).without_merged_revisions();
    let entries = log_entries(&mut backend, "/wc", &options).unwrap();
    assert!(entries.iter().all(|e| !e.has_children()));
    assert_eq!(entries.len(), 7);
}

#[test]
fn truncated_log_is_an_integrity_error() {
    let mut history = merge_history();
    history.truncate(5);
    let mut backend = MemoryBackend {
        log: history,
        ..MemoryBackend::default()
    };
    let err = log_entries(&mut backend, "/wc", &LogOptions::between(20, 1)).unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::TruncatedMergeGroup { ref open_revisions } if open_revisions == &[19, 14]
    ));
}

#[test]
fn externals_resolve_against_holder() {
    let property = "\
# vendored code
-r12 ^/vendor/skin-maker@21 third-party/skins/toolkit
../common/lib%20core lib
third-party/sounds http://svn.example.com/repos/sounds
";
    let resolved = resolve_externals(
        property,
        "http://svn.example.com/repos/project/trunk",
        "http://svn.example.com/repos/project",
    )
    .unwrap();

    assert_eq!(resolved.len(), 3);
    assert_eq!(resolved[0].local_path, "third-party/skins/toolkit");
    assert_eq!(
        resolved[0].url,
        "http://svn.example.com/repos/project/vendor/skin-maker"
    );
    assert_eq!(resolved[0].revision, Some(Revision::Number(12)));
    assert_eq!(resolved[0].peg_revision, Some(Revision::Number(21)));

    assert_eq!(resolved[1].local_path, "lib");
    assert_eq!(
        resolved[1].url,
        "http://svn.example.com/repos/project/common/lib core"
    );

    assert_eq!(resolved[2].local_path, "third-party/sounds");
    assert_eq!(resolved[2].url, "http://svn.example.com/repos/sounds");
    assert_eq!(resolved[2].revision, None);
}

#[test]
fn conflicted_roots_are_minimal() {
    let mut backend = working_copy();
    let entries = status(&mut backend, "/wc", &StatusOptions::default(), &NeverCancelled).unwrap();
    let conflicted: Vec<&str> = entries
        .iter()
        .filter(|e| e.has_conflict())
        .map(PathEntry::path_prev)
        .chain(["/wc/src/main.rs"])
        .collect();
    assert_eq!(shrink_to_roots(&conflicted), ["/wc/src", "/wc/docs", "/wc/lib"]);
}
