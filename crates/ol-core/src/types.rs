//! Core type definitions for originlist
//!
//! Rules are built once from configuration and are immutable afterwards.
//! The resolver hands out borrowed views of them through [`Access`].

use std::fmt;

use crate::uri::UriRef;

// =============================================================================
// Reserved Tokens
// =============================================================================

/// Configuration token that declares access for local app content.
pub const LOCAL_ACCESS_TOKEN: &str = "WIDGET_LOCAL";

/// Scheme used by packaged application content.
pub const LOCAL_SCHEME: &str = "local";
pub const FILE_SCHEME: &str = "file";
pub const DATA_SCHEME: &str = "data";

/// Origin marker used for local app content in the host's permission table.
pub const LOCAL_MARKER: &str = "local://";
/// Origin marker used for `file:` content in the host's permission table.
pub const FILE_MARKER: &str = "file://";

/// Default endpoint the framework serves its own resources from.
pub const DEFAULT_INTERNAL_ENDPOINT: &str = "http://localhost:8472";

// =============================================================================
// Scheme Classes
// =============================================================================

bitflags::bitflags! {
    /// Coarse classification of a URI scheme.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SchemeClass: u8 {
        /// Any scheme that addresses a network authority (http, https, ws, ...)
        const WEB = 1 << 0;
        /// Packaged app content (`local:`)
        const LOCAL = 1 << 1;
        /// Device file system (`file:`)
        const FILE = 1 << 2;
        /// Inline content (`data:`)
        const DATA = 1 << 3;

        /// Schemes that may legitimately carry no authority.
        const NON_NETWORK = Self::LOCAL.bits() | Self::FILE.bits() | Self::DATA.bits();
    }
}

impl SchemeClass {
    /// Classify a scheme name. Comparison is case-insensitive.
    pub fn of(scheme: &str) -> Self {
        if scheme.eq_ignore_ascii_case(LOCAL_SCHEME) {
            Self::LOCAL
        } else if scheme.eq_ignore_ascii_case(FILE_SCHEME) {
            Self::FILE
        } else if scheme.eq_ignore_ascii_case(DATA_SCHEME) {
            Self::DATA
        } else {
            Self::WEB
        }
    }
}

// =============================================================================
// Features
// =============================================================================

/// Opaque identifier of a native capability granted by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// =============================================================================
// Access Rules
// =============================================================================

/// What a rule grants access to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    /// The reserved local app content rule. Matches only `local:` requests.
    Local,
    /// An ordinary rule declared with a URI.
    Uri(UriRef),
}

/// A single access rule from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    /// URI exactly as declared
    pub raw_uri: String,
    pub target: RuleTarget,
    pub allow_subdomain: bool,
    /// Feature ids in declaration order
    pub features: Vec<FeatureId>,
}

impl AccessRule {
    /// Build a rule from its declared URI. The reserved local token yields a
    /// [`RuleTarget::Local`] rule; anything else is parsed as a URI.
    pub fn new(raw_uri: impl Into<String>, allow_subdomain: bool, features: Vec<FeatureId>) -> Self {
        let raw_uri = raw_uri.into();
        let target = if raw_uri == LOCAL_ACCESS_TOKEN {
            RuleTarget::Local
        } else {
            RuleTarget::Uri(UriRef::parse(&raw_uri))
        };

        Self {
            raw_uri,
            target,
            allow_subdomain,
            features,
        }
    }

    /// Shorthand for a rule without features.
    pub fn uri(raw_uri: impl Into<String>, allow_subdomain: bool) -> Self {
        Self::new(raw_uri, allow_subdomain, Vec::new())
    }

    #[inline]
    pub fn is_local_marker(&self) -> bool {
        matches!(self.target, RuleTarget::Local)
    }

    /// Parsed URI of an ordinary rule.
    #[inline]
    pub fn uri_ref(&self) -> Option<&UriRef> {
        match &self.target {
            RuleTarget::Uri(uri) => Some(uri),
            RuleTarget::Local => None,
        }
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f.as_str() == feature)
    }
}

// =============================================================================
// Access Result
// =============================================================================

/// Successful outcome of a resolver lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'a> {
    /// The request is covered by this rule.
    Rule(&'a AccessRule),
    /// The request is allowed regardless of configuration (`data:` URIs).
    Unconditional,
}

impl<'a> Access<'a> {
    /// The matched rule, if the access came from one.
    pub fn rule(&self) -> Option<&'a AccessRule> {
        match self {
            Access::Rule(rule) => Some(rule),
            Access::Unconditional => None,
        }
    }
}
