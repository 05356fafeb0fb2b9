//! Path canonicalization and hierarchical path-set helpers.
//!
//! Paths are `/`-separated. Absolute paths keep their leading `/`, whose
//! outermost ancestor is `/`; URLs (`scheme://host/...`) stop at their
//! authority.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::ReconcileError;

fn canonicalize(path: &str, allow_empty: bool) -> Result<Cow<'_, str>, ReconcileError> {
    let raw = path.trim();

    if raw.contains('\0') {
        return Err(ReconcileError::InvalidPath("unsafe path".into()));
    }

    let absolute = raw.starts_with(['/', '\\']);
    let trimmed = raw.trim_matches(['/', '\\']);

    let mut parts: Vec<&str> = Vec::new();
    let mut needs_alloc = raw.contains('\\') || trimmed.len() + usize::from(absolute) != raw.len();

    for seg in trimmed.split(['/', '\\']) {
        if seg.is_empty() || seg == "." {
            needs_alloc = true;
            continue;
        }
        if seg == ".." {
            return Err(ReconcileError::InvalidPath("unsafe path".into()));
        }
        parts.push(seg);
    }

    if parts.is_empty() {
        if absolute {
            return Ok(Cow::Borrowed("/"));
        }
        if allow_empty {
            return Ok(Cow::Borrowed(""));
        }
        return Err(ReconcileError::InvalidPath("empty path".into()));
    }

    if !needs_alloc {
        return Ok(Cow::Borrowed(&raw[..trimmed.len() + usize::from(absolute)]));
    }

    let joined = parts.join("/");
    Ok(Cow::Owned(if absolute { format!("/{joined}") } else { joined }))
}

/// Canonicalizes a path: `\` becomes `/`, empty and `.` segments and trailing
/// separators are dropped. `..` segments, NUL bytes and empty paths are
/// rejected.
pub fn canonicalize_path(path: &str) -> Result<Cow<'_, str>, ReconcileError> {
    canonicalize(path, false)
}

/// Like [`canonicalize_path`], but an empty path (the root of a relative
/// tree) is accepted.
pub fn canonicalize_dir_path(path: &str) -> Result<Cow<'_, str>, ReconcileError> {
    canonicalize(path, true)
}

fn trim_separator(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// Returns the parent of `path`, or `None` at the outermost ancestor.
pub fn parent(path: &str) -> Option<&str> {
    let path = trim_separator(path);
    let floor = match path.find("://") {
        Some(idx) => idx + 3 + path[idx + 3..].find('/')?,
        None => 0,
    };
    let idx = path.rfind('/')?;
    if idx < floor {
        return None;
    }
    if idx == 0 {
        return (path.len() > 1).then_some("/");
    }
    Some(&path[..idx])
}

/// Whether `ancestor` is `path` or one of its ancestors (segment-wise).
pub fn is_prefix_of(ancestor: &str, path: &str) -> bool {
    let ancestor = trim_separator(ancestor);
    let path = trim_separator(path);
    if ancestor == path {
        return true;
    }
    path.starts_with(ancestor)
        && (ancestor.ends_with('/') || path.as_bytes().get(ancestor.len()) == Some(&b'/'))
}

fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(parent(path), |p| parent(*p))
}

/// Removes every path that has an ancestor in the same set.
///
/// The surviving roots keep their original relative order; duplicates are
/// reported once.
///
/// ```
/// # use svn_reconcile::shrink_to_roots;
/// let roots = shrink_to_roots(&["trunk/a/b", "branches/x", "trunk/a", "trunk/a"]);
/// assert_eq!(roots, vec!["branches/x", "trunk/a"]);
/// ```
pub fn shrink_to_roots<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    let set: HashSet<&str> = paths.iter().map(|p| trim_separator(p.as_ref())).collect();
    let mut seen = HashSet::new();
    let mut roots = Vec::new();
    for path in paths {
        let path = trim_separator(path.as_ref());
        if ancestors(path).any(|a| set.contains(a)) {
            continue;
        }
        if seen.insert(path) {
            roots.push(path.to_string());
        }
    }
    roots
}

/// Returns the closest common parent of all paths.
///
/// The search starts at the parent of the first path, so the result is always
/// a strict ancestor of it. Returns `None` for an empty input or when the
/// paths belong to disjoint trees.
pub fn common_ancestor<S: AsRef<str>>(paths: &[S]) -> Option<String> {
    let first = paths.first()?.as_ref();
    ancestors(first)
        .find(|base| paths.iter().all(|p| is_prefix_of(base, p.as_ref())))
        .map(str::to_string)
}

/// Groups paths by their outermost ancestor and returns the common parent of
/// each group that has one, in order of first appearance.
pub fn common_ancestors<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let root = ancestors(path).last().unwrap_or(trim_separator(path));
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(path),
            None => groups.push((root, vec![path])),
        }
    }
    let mut result: Vec<String> = Vec::new();
    for (_, members) in groups {
        if let Some(parent) = common_ancestor(&members)
            && !result.contains(&parent)
        {
            result.push(parent);
        }
    }
    result
}

/// Returns the ancestors that must exist before `paths` can be applied.
///
/// For every path, its ancestors are collected until one is already part of
/// the input set. The absolute root `/` is never reported.
pub fn path_nodes<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    let set: HashSet<&str> = paths.iter().map(|p| trim_separator(p.as_ref())).collect();
    let mut seen = HashSet::new();
    let mut nodes = Vec::new();
    for path in paths {
        for ancestor in ancestors(path.as_ref()) {
            if set.contains(ancestor) || ancestor == "/" {
                break;
            }
            if seen.insert(ancestor) {
                nodes.push(ancestor.to_string());
            }
        }
    }
    nodes
}
