//! Ordering of flat change sets.
//!
//! Consumers that apply a change set need parents created before children and
//! children deleted before parents. `parent_to_child == true` sorts ascending
//! (parents first), `false` sorts descending (children first).

use std::cmp::Ordering;

use crate::{PathEntry, StatusKind};

/// Reorders diff-style entries by `path_prev`.
///
/// Entries with the same path keep their relative order, except that a
/// [`StatusKind::Deleted`] entry goes before the other entries for that path
/// when `parent_to_child` is set and after them otherwise. After sorting, every
/// deletion pulls the later deletions whose path starts with its own path to
/// immediately after itself, so a deleted subtree stays grouped under its root.
///
/// ```
/// # use svn_reconcile::{reorder_diff, NodeKind, PathEntry, StatusKind};
/// let mut entries = vec![
///     PathEntry::new("/a/b", NodeKind::File, StatusKind::Deleted),
///     PathEntry::new("/a", NodeKind::Dir, StatusKind::Added),
///     PathEntry::new("/a/b", NodeKind::Dir, StatusKind::Added),
/// ];
/// reorder_diff(&mut entries, true);
/// let order: Vec<_> = entries
///     .iter()
///     .map(|e| (e.path_prev(), e.text_status().as_char()))
///     .collect();
/// assert_eq!(order, [("/a", 'A'), ("/a/b", 'D'), ("/a/b", 'A')]);
/// ```
pub fn reorder_diff(entries: &mut [PathEntry], parent_to_child: bool) {
    entries.sort_by(|a, b| compare_diff(a, b, parent_to_child));

    let mut placed = vec![false; entries.len()];
    let mut order = Vec::with_capacity(entries.len());
    for i in 0..entries.len() {
        if placed[i] {
            continue;
        }
        placed[i] = true;
        order.push(i);
        if entries[i].text_status() != StatusKind::Deleted {
            continue;
        }
        let root = entries[i].path_prev();
        for m in i + 1..entries.len() {
            if !placed[m]
                && entries[m].text_status() == StatusKind::Deleted
                && entries[m].path_prev().starts_with(root)
            {
                placed[m] = true;
                order.push(m);
            }
        }
    }
    apply_order(entries, &order);
}

fn compare_diff(a: &PathEntry, b: &PathEntry, parent_to_child: bool) -> Ordering {
    let by_path = directed(a.path_prev().cmp(b.path_prev()), parent_to_child);
    if by_path == Ordering::Equal && a.text_status() != b.text_status() {
        let deleted_first = if parent_to_child {
            Ordering::Less
        } else {
            Ordering::Greater
        };
        if a.text_status() == StatusKind::Deleted {
            return deleted_first;
        }
        if b.text_status() == StatusKind::Deleted {
            return deleted_first.reverse();
        }
    }
    by_path
}

/// Reorders status-style entries lexicographically by path.
pub fn reorder_status(entries: &mut [PathEntry], parent_to_child: bool) {
    entries.sort_by(|a, b| directed(a.path_prev().cmp(b.path_prev()), parent_to_child));
}

/// Reorders paths or URLs segment by segment.
///
/// Unlike a plain string sort, a parent always sorts next to its children even
/// when a sibling name contains characters that sort before `/`
/// (`trunk/a` < `trunk/a/b` < `trunk/a-b`).
pub fn reorder_paths<S: AsRef<str>>(paths: &mut [S], parent_to_child: bool) {
    paths.sort_by(|a, b| {
        let ordering = a.as_ref().split('/').cmp(b.as_ref().split('/'));
        directed(ordering, parent_to_child)
    });
}

fn directed(ordering: Ordering, parent_to_child: bool) -> Ordering {
    if parent_to_child {
        ordering
    } else {
        ordering.reverse()
    }
}

// `order[k]` is the current index of the item that belongs at position `k`.
fn apply_order<T>(items: &mut [T], order: &[usize]) {
    for (k, &source) in order.iter().enumerate() {
        let mut source = source;
        while source < k {
            source = order[source];
        }
        items.swap(k, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeKind;

    fn entry(path: &str, status: StatusKind) -> PathEntry {
        PathEntry::new(path, NodeKind::Dir, status)
    }

    fn summary(entries: &[PathEntry]) -> Vec<(String, StatusKind)> {
        entries
            .iter()
            .map(|e| (e.path_prev().to_string(), e.text_status()))
            .collect()
    }

    fn expect(items: &[(&str, StatusKind)]) -> Vec<(String, StatusKind)> {
        items.iter().map(|(p, s)| (p.to_string(), *s)).collect()
    }

    #[test]
    fn deletion_precedes_addition_at_same_path() {
        let mut entries = vec![
            entry("/a/b", StatusKind::Deleted),
            entry("/a", StatusKind::Added),
            entry("/a/b", StatusKind::Added),
        ];
        reorder_diff(&mut entries, true);
        assert_eq!(
            summary(&entries),
            expect(&[
                ("/a", StatusKind::Added),
                ("/a/b", StatusKind::Deleted),
                ("/a/b", StatusKind::Added),
            ])
        );
    }

    #[test]
    fn deletion_follows_at_same_path_in_reverse() {
        let mut entries = vec![
            entry("/a", StatusKind::Added),
            entry("/a/b", StatusKind::Deleted),
            entry("/a/b", StatusKind::Added),
        ];
        reorder_diff(&mut entries, false);
        assert_eq!(
            summary(&entries),
            expect(&[
                ("/a/b", StatusKind::Added),
                ("/a/b", StatusKind::Deleted),
                ("/a", StatusKind::Added),
            ])
        );
    }

    #[test]
    fn deletions_are_grouped_under_their_root() {
        let mut entries = vec![
            entry("/a/y", StatusKind::Deleted),
            entry("/a/x", StatusKind::Added),
            entry("/a", StatusKind::Deleted),
            entry("/b", StatusKind::Modified),
            entry("/a/z", StatusKind::Deleted),
        ];
        reorder_diff(&mut entries, true);
        assert_eq!(
            summary(&entries),
            expect(&[
                ("/a", StatusKind::Deleted),
                ("/a/y", StatusKind::Deleted),
                ("/a/z", StatusKind::Deleted),
                ("/a/x", StatusKind::Added),
                ("/b", StatusKind::Modified),
            ])
        );
    }

    #[test]
    fn replaced_tree_reports_deletions_before_additions() {
        let mut entries = vec![
            entry("/t", StatusKind::Added),
            entry("/t/f", StatusKind::Added),
            entry("/t/f", StatusKind::Deleted),
            entry("/t", StatusKind::Deleted),
        ];
        reorder_diff(&mut entries, true);
        assert_eq!(
            summary(&entries),
            expect(&[
                ("/t", StatusKind::Deleted),
                ("/t/f", StatusKind::Deleted),
                ("/t", StatusKind::Added),
                ("/t/f", StatusKind::Added),
            ])
        );
    }

    #[test]
    fn equal_entries_keep_arrival_order() {
        let mut entries = vec![
            entry("/a", StatusKind::Modified).with_path_next("first"),
            entry("/a", StatusKind::Modified).with_path_next("second"),
        ];
        reorder_diff(&mut entries, true);
        assert_eq!(entries[0].path_next(), Some("first"));
        assert_eq!(entries[1].path_next(), Some("second"));
    }

    #[test]
    fn empty_and_single_inputs_are_untouched() {
        let mut empty: Vec<PathEntry> = Vec::new();
        reorder_diff(&mut empty, true);
        assert!(empty.is_empty());

        let mut single = vec![entry("/a", StatusKind::Deleted)];
        reorder_diff(&mut single, false);
        assert_eq!(single[0].path_prev(), "/a");
    }

    #[test]
    fn status_entries_sort_by_path_in_both_directions() {
        let mut entries = vec![
            entry("/b", StatusKind::Modified),
            entry("/a/c", StatusKind::Added),
            entry("/a", StatusKind::Added),
        ];
        reorder_status(&mut entries, true);
        let paths: Vec<_> = entries.iter().map(PathEntry::path_prev).collect();
        assert_eq!(paths, ["/a", "/a/c", "/b"]);

        reorder_status(&mut entries, false);
        let paths: Vec<_> = entries.iter().map(PathEntry::path_prev).collect();
        assert_eq!(paths, ["/b", "/a/c", "/a"]);
    }

    #[test]
    fn paths_sort_segment_wise() {
        let mut paths = vec!["trunk/a-b", "trunk/a/b", "trunk/a"];
        reorder_paths(&mut paths, true);
        assert_eq!(paths, ["trunk/a", "trunk/a/b", "trunk/a-b"]);

        reorder_paths(&mut paths, false);
        assert_eq!(paths, ["trunk/a-b", "trunk/a/b", "trunk/a"]);
    }

    #[test]
    fn apply_order_handles_cycles() {
        let mut items = vec!['a', 'b', 'c', 'd'];
        apply_order(&mut items, &[2, 0, 3, 1]);
        assert_eq!(items, ['c', 'a', 'd', 'b']);
    }
}
