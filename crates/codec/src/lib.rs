//! Table-driven marshalling for shapewire
//!
//! Instead of one generated marshaller and unmarshaller per shape, this crate
//! interprets a [`ServiceModel`] at runtime:
//!
//! - [`json::JsonRequestMarshaller`] writes a request model as an awsJson body
//!   plus the transport metadata (`X-Amz-Target`, content headers)
//! - [`json::JsonUnmarshaller`] reads awsJson response bodies
//! - [`xml::StructureUnmarshaller`] walks XML pull-parser events with a depth
//!   cursor ([`xml::XmlUnmarshallerContext`]) to populate a result model
//! - [`xml::XmlRequestMarshaller`] writes restXml request bodies
//!
//! All of them are single-pass and synchronous; the service model is only read.

pub mod json;
mod request;
pub mod timestamp;
pub mod xml;

pub use request::{HttpMethod, Request};

use shapewire_common::{ServiceModel, StructureShape, WireError};
use thiserror::Error;

/// Errors raised while marshalling or unmarshalling
///
/// Parser and conversion errors are carried through unchanged.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Integer(#[from] std::num::ParseIntError),

    #[error(transparent)]
    Float(#[from] std::num::ParseFloatError),

    #[error(transparent)]
    Timestamp(#[from] chrono::ParseError),

    #[error("Encountered unexpected event: {0}")]
    UnexpectedEvent(String),

    #[error("Unknown shape: {0}")]
    UnknownShape(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Expected {expected} for {field}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Look up a structure shape or fail with [`CodecError::UnknownShape`]
pub(crate) fn structure<'a>(service: &'a ServiceModel, name: &str) -> Result<&'a StructureShape> {
    service
        .structure(name)
        .ok_or_else(|| CodecError::UnknownShape(name.to_string()))
}

/// Input shape of `operation`, failing for unknown operations
pub(crate) fn input_shape<'a>(
    service: &'a ServiceModel,
    operation: &str,
) -> Result<(&'a shapewire_common::OperationShape, Option<&'a StructureShape>)> {
    let op = service
        .operation(operation)
        .ok_or_else(|| CodecError::UnknownOperation(operation.to_string()))?;
    let shape = match &op.input {
        Some(name) => Some(structure(service, name)?),
        None => None,
    };
    Ok((op, shape))
}
