//! Service model loading for shapewire
//!
//! This crate turns a provider's published service definition into the
//! shape table (`ServiceModel`) that drives the generic codec.
//!
//! ## Loading Strategy
//!
//! AWS publishes every service as a Smithy JSON AST document. We read:
//! - the service shape, for the protocol, target prefix and XML namespace
//! - structure/union shapes, for ordered field descriptors
//! - enum shapes (and 1.0-style enum traits), for closed token sets
//! - operation shapes, for input/output names and HTTP bindings

pub mod smithy;
mod type_mapper;

pub use smithy::SmithyParser;
pub use type_mapper::TypeMapper;

use shapewire_common::{Result, ServiceModel};
use std::path::Path;

/// Load a service model from a Smithy JSON AST file
///
/// # Arguments
/// * `path` - Path to the Smithy JSON document
///
/// # Returns
/// * `ServiceModel` - Shape table for the service
pub fn load_service_model<P: AsRef<Path>>(path: P) -> Result<ServiceModel> {
    SmithyParser::from_file(path)?.parse()
}
