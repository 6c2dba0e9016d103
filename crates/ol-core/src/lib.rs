//! originlist Core Library
//!
//! This crate decides, for any requested resource URI, whether a web context
//! may access it and which native features are exposed to it, and keeps a
//! WebView host's cross-origin permission table in step with that decision.
//!
//! # Architecture
//!
//! Rules come from configuration as an ordered list. The resolver groups them
//! lazily into one folder index per (scheme, authority) and resolves requests
//! by longest registered folder prefix, climbing subdomain labels when the
//! request's own authority has no rule. All operations are synchronous and
//! total: malformed input yields a deny, never an error.
//!
//! # Modules
//!
//! - `uri`: URI decomposition and authority climbing
//! - `path_index`: depth-indexed folder lookup for one authority
//! - `resolver`: rule set ownership and the full match algorithm
//! - `whitelist`: allow/feature queries for the request dispatcher
//! - `origin_sync`: mirrors whitelisted origins into WebView hosts
//! - `types`: Shared type definitions

pub mod types;
pub mod uri;
pub mod path_index;
pub mod resolver;
pub mod whitelist;
pub mod origin_sync;

// Re-export commonly used types
pub use origin_sync::{OriginPermissionHost, OriginSync, RecordingHost};
pub use path_index::PathIndex;
pub use resolver::{AccessResolver, RuleSetError};
pub use types::{Access, AccessRule, FeatureId, RuleTarget, SchemeClass};
pub use uri::UriRef;
pub use whitelist::Whitelist;
