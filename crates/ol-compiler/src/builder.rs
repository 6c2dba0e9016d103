//! Whitelist builder
//!
//! Turns a validated [`ConfigDocument`] into the rule list and the
//! [`Whitelist`] the dispatcher queries.

use ol_core::{AccessRule, FeatureId, Whitelist};

use crate::optimizer::{optimize_descriptors, OptimizeStats};
use crate::parser::{AccessDescriptor, ConfigDocument, ConfigError};

/// A built whitelist plus what the build did to the access list.
pub struct CompiledConfig {
    pub whitelist: Whitelist,
    pub internal_endpoint: String,
    pub stats: OptimizeStats,
}

/// Convert descriptors to rules, in declaration order.
pub fn compile_rules(descriptors: &[AccessDescriptor]) -> Vec<AccessRule> {
    descriptors.iter().map(compile_rule).collect()
}

fn compile_rule(descriptor: &AccessDescriptor) -> AccessRule {
    let features = descriptor
        .features
        .iter()
        .map(|f| FeatureId::new(f.id.trim()))
        .collect();
    AccessRule::new(descriptor.uri.trim(), descriptor.allow_sub_domain, features)
}

/// Validate, de-duplicate and build.
pub fn build_whitelist(document: &ConfigDocument) -> Result<CompiledConfig, ConfigError> {
    document.validate()?;

    let mut descriptors = document.access_list.clone();
    let stats = optimize_descriptors(&mut descriptors);
    let rules = compile_rules(&descriptors);

    log::debug!(
        "compiled {} access rules ({} duplicates dropped), multi access {}",
        rules.len(),
        stats.deduped,
        document.has_multi_access
    );

    let whitelist = Whitelist::from_rules(rules, document.has_multi_access)?;

    Ok(CompiledConfig {
        whitelist,
        internal_endpoint: document.internal_endpoint().to_string(),
        stats,
    })
}
