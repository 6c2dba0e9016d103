use std::collections::HashSet;

use crate::parser::AccessDescriptor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
}

/// Drop descriptors identical to an earlier one. The survivors keep their
/// declared order, so first-match semantics are unchanged.
pub fn optimize_descriptors(descriptors: &mut Vec<AccessDescriptor>) -> OptimizeStats {
    let before = descriptors.len();

    let mut seen: HashSet<DescriptorKey> = HashSet::new();
    let mut deduped = 0usize;
    descriptors.retain(|descriptor| {
        if seen.insert(DescriptorKey::from(descriptor)) {
            true
        } else {
            log::warn!("dropping duplicate access entry for {}", descriptor.uri);
            deduped += 1;
            false
        }
    });

    OptimizeStats {
        before,
        after: descriptors.len(),
        deduped,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DescriptorKey {
    uri: String,
    allow_sub_domain: bool,
    features: Vec<String>,
}

impl From<&AccessDescriptor> for DescriptorKey {
    fn from(descriptor: &AccessDescriptor) -> Self {
        Self {
            uri: descriptor.uri.trim().to_string(),
            allow_sub_domain: descriptor.allow_sub_domain,
            features: descriptor.features.iter().map(|f| f.id.clone()).collect(),
        }
    }
}
