//! Access Resolver
//!
//! Owns the ordered rule set and answers "which rule, if any, covers this
//! URL". Rules are grouped into one [`PathIndex`] per (scheme, authority),
//! built lazily on the first query. Requests whose authority has no index
//! climb subdomain labels (and drop their port) until one is found.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::path_index::{self, PathIndex, RuleId, QUERY_WILDCARD};
use crate::types::{Access, AccessRule, RuleTarget, SchemeClass};
use crate::uri::{climb_authority, parent_authority, UriRef};

/// Error type for rule set construction.
#[derive(Debug, thiserror::Error)]
pub enum RuleSetError {
    #[error("Local access declared more than once (rules {first} and {second})")]
    DuplicateLocalRule { first: usize, second: usize },
}

/// scheme -> authority -> folder index
type AuthorityIndex = HashMap<String, HashMap<String, PathIndex>>;

/// Summary of one folder index, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStat {
    pub scheme: String,
    pub authority: String,
    pub entries: usize,
    pub max_depth: usize,
}

// =============================================================================
// Resolver
// =============================================================================

pub struct AccessResolver {
    rules: Vec<AccessRule>,
    global_access: bool,
    local_access: Option<RuleId>,
    index: OnceLock<AuthorityIndex>,
}

impl AccessResolver {
    /// Create a resolver over `rules`. Order is kept as given.
    pub fn new(rules: Vec<AccessRule>, global_access: bool) -> Result<Self, RuleSetError> {
        let mut local_access = None;
        for (id, rule) in rules.iter().enumerate() {
            if !rule.is_local_marker() {
                continue;
            }
            if let Some(first) = local_access {
                return Err(RuleSetError::DuplicateLocalRule { first, second: id });
            }
            local_access = Some(id);
        }

        Ok(Self {
            rules,
            global_access,
            local_access,
            index: OnceLock::new(),
        })
    }

    #[inline]
    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    #[inline]
    pub fn global_access(&self) -> bool {
        self.global_access
    }

    /// The rule declared with the local access token, if any.
    #[inline]
    pub fn local_access(&self) -> Option<&AccessRule> {
        self.local_access.map(|id| &self.rules[id])
    }

    /// Resolve `url` to the rule that grants access to it.
    ///
    /// Returns `None` for relative or unparsable input and for URLs no rule
    /// covers. `data:` URIs are always [`Access::Unconditional`].
    pub fn get_access_by_url(&self, url: &str) -> Option<Access<'_>> {
        let uri = UriRef::parse(url);
        if !uri.is_absolute() {
            return None;
        }

        let class = uri.scheme_class();
        let resolved = self.authority_check(&uri.port, &uri.scheme, &uri.authority);
        if resolved.is_none() && !class.intersects(SchemeClass::NON_NETWORK) {
            log::trace!("no index for authority of {url}");
            return None;
        }

        let authority = resolved.unwrap_or_default();
        let folder = self.folder(&uri.scheme, &authority);

        if class == SchemeClass::DATA {
            return Some(Access::Unconditional);
        }

        let Some(folder) = folder else {
            if class == SchemeClass::LOCAL {
                return self.local_access().map(Access::Rule);
            }
            return None;
        };

        if let Some(id) = self.resolve_from_index(&authority, &uri) {
            return Some(Access::Rule(&self.rules[id]));
        }

        if let Some(local) = self.local_access().filter(|rule| self.is_match(rule, &uri)) {
            return Some(Access::Rule(local));
        }

        folder
            .lookup_exact("/")
            .map(|id| &self.rules[id])
            .filter(|rule| self.is_match(rule, &uri))
            .map(Access::Rule)
    }

    /// Find the authority, starting from `authority`, that has an index for
    /// `scheme`.
    ///
    /// A request port without its own index is dropped first; if the
    /// port-less authority finds nothing either, the port is restored.
    /// Dotted authorities then climb their labels; bare hostnames never do.
    pub fn authority_check(&self, port: &str, scheme: &str, authority: &str) -> Option<String> {
        if !port.is_empty() && !self.has_index(scheme, authority) {
            let suffix = format!(":{port}");
            if let Some(stripped) = authority.strip_suffix(suffix.as_str()) {
                if let Some(found) = self.authority_check("", scheme, stripped) {
                    return Some(found);
                }
            }
        }

        if !authority.contains('.') {
            return self
                .has_index(scheme, authority)
                .then(|| authority.to_string());
        }

        climb_authority(authority)
            .find(|candidate| self.has_index(scheme, candidate))
            .map(str::to_string)
    }

    /// Look `uri` up in the index for `authority`, climbing to parent
    /// authorities while the candidate rule is missing or does not match.
    pub fn resolve_from_index(&self, authority: &str, uri: &UriRef) -> Option<RuleId> {
        let scheme = uri.scheme.as_str();
        let target = uri.path_and_query();
        let depth = path_index::depth(&target);

        let mut authority = authority.to_string();
        let mut folder = self.folder(scheme, &authority)?;
        let mut candidate = folder.lookup(&target, depth);

        loop {
            if let Some(id) = candidate {
                if self.is_match(&self.rules[id], uri) {
                    return Some(id);
                }
            }

            let next = parent_authority(&authority);
            if next == authority {
                return None;
            }

            log::trace!("climbing from {authority} to {next} for {}", uri.source);
            authority = self.authority_check(&uri.port, scheme, next)?;
            folder = self.folder(scheme, &authority)?;
            candidate = folder.lookup(&target, depth);
        }
    }

    /// Whether `rule` covers `uri`.
    pub fn is_match(&self, rule: &AccessRule, uri: &UriRef) -> bool {
        let class = uri.scheme_class();

        // Local access matches local content only, never file access.
        let rule_uri = match &rule.target {
            RuleTarget::Local => return class == SchemeClass::LOCAL,
            RuleTarget::Uri(rule_uri) => rule_uri,
        };

        if class == SchemeClass::DATA {
            return true;
        }

        if !rule_uri.scheme.eq_ignore_ascii_case(&uri.scheme) {
            return false;
        }

        if uri.authority.is_empty() && !class.intersects(SchemeClass::FILE | SchemeClass::LOCAL) {
            return false;
        }

        let host_ok = uri.host == rule_uri.host
            || (rule.allow_subdomain
                && uri
                    .host
                    .strip_suffix(rule_uri.host.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.')));
        if !host_ok {
            return false;
        }

        if !rule_uri.port.is_empty() && rule_uri.port != uri.port {
            return false;
        }

        if rule_uri.query == QUERY_WILDCARD {
            return true;
        }

        let rule_path = folder_path(&rule_uri.path).to_lowercase();
        let uri_path = folder_path(&uri.path).to_lowercase();
        uri_path.starts_with(&rule_path)
    }

    /// Per-authority index summary, sorted by scheme then authority.
    pub fn index_stats(&self) -> Vec<IndexStat> {
        let mut stats: Vec<IndexStat> = self
            .index()
            .iter()
            .flat_map(|(scheme, by_authority)| {
                by_authority.iter().map(move |(authority, folder)| IndexStat {
                    scheme: scheme.clone(),
                    authority: authority.clone(),
                    entries: folder.len(),
                    max_depth: folder.max_depth(),
                })
            })
            .collect();
        stats.sort_by(|a, b| (&a.scheme, &a.authority).cmp(&(&b.scheme, &b.authority)));
        stats
    }

    // =========================================================================
    // Index
    // =========================================================================

    fn index(&self) -> &AuthorityIndex {
        self.index.get_or_init(|| self.build_index())
    }

    fn build_index(&self) -> AuthorityIndex {
        let mut index = AuthorityIndex::new();

        for (id, rule) in self.rules.iter().enumerate() {
            let Some(uri) = rule.uri_ref() else {
                continue;
            };

            let mut path = folder_path(&uri.path).to_string();
            if !uri.query.is_empty() {
                path.push('?');
                path.push_str(&uri.query);
            }

            index
                .entry(uri.scheme.clone())
                .or_default()
                .entry(uri.authority.clone())
                .or_default()
                .put(&path, id);
        }

        log::debug!(
            "built access index: {} rules, {} schemes, {} authorities",
            self.rules.len(),
            index.len(),
            index.values().map(HashMap::len).sum::<usize>()
        );

        index
    }

    #[inline]
    fn folder(&self, scheme: &str, authority: &str) -> Option<&PathIndex> {
        self.index().get(scheme)?.get(authority)
    }

    #[inline]
    fn has_index(&self, scheme: &str, authority: &str) -> bool {
        self.folder(scheme, authority).is_some()
    }
}

#[inline]
fn folder_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}
