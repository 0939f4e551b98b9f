//! Service metadata overrides loaded from YAML files
//!
//! Protocol metadata normally comes from the service model itself. A metadata
//! file lets a caller pin or correct it (e.g., an older target prefix) without
//! editing the model.
//!
//! ```yaml
//! service_name: DataPipeline
//! target_prefix: DataPipeline
//! protocol: awsJson1_1
//! json_version: "1.1"
//! ```

use crate::{Protocol, Result, ServiceModel, WireError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Optional overrides for a [`ServiceModel`]'s protocol metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceMetadata {
    #[serde(default)]
    pub service_name: Option<String>,
    /// Prefix of the `X-Amz-Target` header
    #[serde(default)]
    pub target_prefix: Option<String>,
    #[serde(default)]
    pub protocol: Option<Protocol>,
    /// JSON dialect version (e.g., "1.0", "1.1")
    #[serde(default)]
    pub json_version: Option<String>,
    #[serde(default)]
    pub xml_namespace: Option<String>,
    #[serde(default)]
    pub endpoint_prefix: Option<String>,
}

impl ServiceMetadata {
    /// Load metadata from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            WireError::Parse(format!("Failed to read metadata file {:?}: {}", path, e))
        })?;

        Self::from_yaml(&content).map_err(|e| {
            WireError::Parse(format!(
                "Failed to parse metadata YAML from {:?}: {}",
                path, e
            ))
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl ServiceModel {
    /// Overwrite protocol metadata with every key `metadata` sets
    pub fn apply_metadata(&mut self, metadata: &ServiceMetadata) {
        if let Some(name) = &metadata.service_name {
            self.service_name = name.clone();
        }
        if let Some(prefix) = &metadata.target_prefix {
            self.target_prefix = prefix.clone();
        }
        if let Some(protocol) = metadata.protocol {
            self.protocol = protocol;
        }
        if let Some(version) = &metadata.json_version {
            self.json_version = Some(version.clone());
        }
        if let Some(namespace) = &metadata.xml_namespace {
            self.xml_namespace = Some(namespace.clone());
        }
        if let Some(prefix) = &metadata.endpoint_prefix {
            self.endpoint_prefix = Some(prefix.clone());
        }
    }
}
