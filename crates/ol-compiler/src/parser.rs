use serde::{Deserialize, Serialize};

use ol_core::resolver::RuleSetError;
use ol_core::types::{DEFAULT_INTERNAL_ENDPOINT, LOCAL_ACCESS_TOKEN};
use ol_core::UriRef;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Access entry {index} has an empty uri")]
    EmptyUri { index: usize },
    #[error("Access entry {index} has a relative uri: {uri}")]
    RelativeUri { index: usize, uri: String },
    #[error("Access entry for {uri} declares a feature with an empty id")]
    EmptyFeatureId { uri: String },
    #[error(transparent)]
    RuleSet(#[from] RuleSetError),
}

/// The configuration document supplied at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Allow navigation to any URL (never XHR).
    #[serde(default)]
    pub has_multi_access: bool,
    #[serde(default)]
    pub access_list: Vec<AccessDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDescriptor {
    pub uri: String,
    #[serde(default)]
    pub allow_sub_domain: bool,
    #[serde(default)]
    pub features: Vec<FeatureDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub id: String,
}

impl ConfigDocument {
    /// Endpoint the framework serves its own resources from.
    pub fn internal_endpoint(&self) -> &str {
        self.internal_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_INTERNAL_ENDPOINT)
    }

    /// Reject shapes the resolver cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut local_index: Option<usize> = None;

        for (index, access) in self.access_list.iter().enumerate() {
            let uri = access.uri.trim();
            if uri.is_empty() {
                return Err(ConfigError::EmptyUri { index });
            }

            if uri == LOCAL_ACCESS_TOKEN {
                if let Some(first) = local_index {
                    return Err(RuleSetError::DuplicateLocalRule { first, second: index }.into());
                }
                local_index = Some(index);
            } else if !UriRef::parse(uri).is_absolute() {
                return Err(ConfigError::RelativeUri {
                    index,
                    uri: uri.to_string(),
                });
            }

            if access.features.iter().any(|f| f.id.trim().is_empty()) {
                return Err(ConfigError::EmptyFeatureId {
                    uri: uri.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Parse and validate a JSON configuration document.
pub fn parse_config(text: &str) -> Result<ConfigDocument, ConfigError> {
    let document: ConfigDocument = serde_json::from_str(text)?;
    document.validate()?;
    Ok(document)
}
