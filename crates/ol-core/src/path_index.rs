//! Folder index for a single (scheme, authority) pair
//!
//! Maps normalized folder paths to rule ids and answers longest-applicable
//! prefix queries. A key is the folder path with surrounding slashes trimmed
//! and lower-cased, optionally followed by `?query` so that `path`,
//! `path?specific` and `path?*` can carry distinct rules.

use std::collections::HashMap;

/// Index of a rule in the resolver's ordered rule list.
pub type RuleId = usize;

/// Query qualifier that matches any query string.
pub const QUERY_WILDCARD: &str = "*";

#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    entries: HashMap<String, RuleId>,
    max_depth: usize,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule at `path` (which may carry a `?query` qualifier).
    /// The first rule registered for a key keeps it.
    pub fn put(&mut self, path: &str, rule: RuleId) {
        let key = normalize(path);
        self.max_depth = self.max_depth.max(depth(&key));
        self.entries.entry(key).or_insert(rule);
    }

    /// Exact lookup. A candidate with a query also tries the `path?*` form.
    pub fn lookup_exact(&self, path: &str) -> Option<RuleId> {
        let key = normalize(path);
        if let Some(&rule) = self.entries.get(&key) {
            return Some(rule);
        }

        let (folder, query) = split_query(&key);
        if query.is_some_and(|q| !q.is_empty()) {
            let wildcard = format!("{folder}?{QUERY_WILDCARD}");
            return self.entries.get(&wildcard).copied();
        }

        None
    }

    /// Longest registered prefix of `path`, where `depth` is the folder
    /// depth of `path`.
    ///
    /// Each miss truncates to `min(max_depth, depth - 1)` segments, since no
    /// entry exists deeper than the deepest registered folder.
    pub fn lookup(&self, path: &str, depth: usize) -> Option<RuleId> {
        if path.is_empty() {
            return None;
        }

        if let Some(rule) = self.lookup_exact(path) {
            return Some(rule);
        }

        // A query-qualified miss falls back to its own folder first.
        if path.contains('?') {
            return self.lookup(&truncate(path, depth), depth);
        }

        let new_depth = self.max_depth.min(depth.saturating_sub(1));
        let shorter = truncate(path, new_depth);
        if shorter == path {
            return None;
        }

        self.lookup(&shorter, new_depth)
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Path Helpers
// =============================================================================

/// Number of non-empty `/`-separated segments. `/` has depth 0.
/// A `?query` suffix is ignored.
pub fn depth(path: &str) -> usize {
    let (folder, _) = split_query(path);
    if folder == "/" {
        return 0;
    }
    segments(folder).count()
}

/// Rebuild a path from the first `n` segments, each prefixed with `/`.
/// `n = 0` yields `/`. Any query suffix is dropped.
pub fn truncate(path: &str, n: usize) -> String {
    let (folder, _) = split_query(path);
    let mut out = String::with_capacity(folder.len());
    for segment in segments(folder).take(n) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Trim slashes and lower-case the folder; keep the query verbatim.
pub fn normalize(path: &str) -> String {
    let (folder, query) = split_query(path);
    let mut key = folder.trim_matches('/').to_lowercase();
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        key.push('?');
        key.push_str(query);
    }
    key
}

#[inline]
fn split_query(path: &str) -> (&str, Option<&str>) {
    match path.split_once('?') {
        Some((folder, query)) => (folder, Some(query)),
        None => (path, None),
    }
}

#[inline]
fn segments(folder: &str) -> impl Iterator<Item = &str> {
    folder.split('/').filter(|s| !s.is_empty())
}
