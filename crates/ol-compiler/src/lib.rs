//! originlist Configuration Compiler
//!
//! This crate turns the declarative access configuration into a validated,
//! de-duplicated rule list and builds the [`ol_core::Whitelist`] over it.

pub mod parser;
pub mod optimizer;
pub mod builder;

pub use builder::{build_whitelist, compile_rules, CompiledConfig};
pub use optimizer::{optimize_descriptors, OptimizeStats};
pub use parser::{parse_config, AccessDescriptor, ConfigDocument, ConfigError, FeatureDescriptor};
