//! Common types and utilities for shapewire
//!
//! This crate contains the shape tables (field descriptors, structures, enums,
//! operations), the generic model value type, and the error types shared by
//! the parser, codec, and CLI components.

pub mod enums;
mod schema;
pub mod service_metadata;
mod value;

pub use schema::{
    EnumShape, FieldDescriptor, HttpBinding, OperationShape, Protocol, ServiceModel,
    StructureShape, XmlBinding,
};
pub use service_metadata::ServiceMetadata;
pub use value::{Model, Value};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading shapes or building requests
#[derive(Error, Debug)]
pub enum WireError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    InvalidArgument(String),

    /// Client-side failure with the original cause attached
    #[error("{message}")]
    Client {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl WireError {
    /// Client error without an underlying cause
    pub fn client(message: impl Into<String>) -> Self {
        WireError::Client {
            message: message.into(),
            source: None,
        }
    }

    /// Client error wrapping `source`
    pub fn client_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        WireError::Client {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for shapewire operations
pub type Result<T> = std::result::Result<T, WireError>;

/// Semantic type of a field in a shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Integer,
    Long,
    Boolean,
    Double,
    Timestamp,
    /// String constrained to the named enum shape
    Enum(String),
    /// Nested structure, by shape name
    Structure(String),
    List(Box<FieldType>),
    Map(Box<FieldType>, Box<FieldType>),
}

impl FieldType {
    /// Name of the nested structure this type refers to, looking through lists and maps
    pub fn structure_name(&self) -> Option<&str> {
        match self {
            FieldType::Structure(name) => Some(name),
            FieldType::List(inner) => inner.structure_name(),
            FieldType::Map(_, value) => value.structure_name(),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            FieldType::Structure(_) | FieldType::List(_) | FieldType::Map(_, _)
        )
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "String"),
            FieldType::Integer => write!(f, "Integer"),
            FieldType::Long => write!(f, "Long"),
            FieldType::Boolean => write!(f, "Boolean"),
            FieldType::Double => write!(f, "Double"),
            FieldType::Timestamp => write!(f, "Timestamp"),
            FieldType::Enum(name) => write!(f, "Enum<{}>", name),
            FieldType::Structure(name) => write!(f, "{}", name),
            FieldType::List(inner) => write!(f, "List<{}>", inner),
            FieldType::Map(key, value) => write!(f, "Map<{}, {}>", key, value),
        }
    }
}
