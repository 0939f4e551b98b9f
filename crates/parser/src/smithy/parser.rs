//! Smithy JSON AST file parser

use super::types::SmithyModel;
use shapewire_common::{Result, ServiceModel, WireError};
use std::fs;
use std::path::Path;

/// Smithy specification parser
///
/// Reads and parses Smithy JSON AST files such as those published in the
/// `aws/api-models-aws` repository.
pub struct SmithyParser {
    /// Loaded Smithy model
    model: SmithyModel,
}

impl SmithyParser {
    /// Load Smithy model from file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = SmithyParser::from_file("models/route53-2013-04-01.json")?;
    /// let service = parser.parse()?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            WireError::Parse(format!(
                "Failed to read Smithy file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse Smithy model from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let model: SmithyModel = serde_json::from_str(json)
            .map_err(|e| WireError::Parse(format!("Failed to parse Smithy JSON: {}", e)))?;

        Ok(Self { model })
    }

    /// Convert the Smithy model into a shape table
    pub fn parse(&self) -> Result<ServiceModel> {
        super::converter::convert_smithy_to_service_model(&self.model)
    }

    /// Get reference to the underlying Smithy model
    pub fn model(&self) -> &SmithyModel {
        &self.model
    }
}
