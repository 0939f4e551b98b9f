//! awsJson protocol support
//!
//! Requests are written through a [`StructuredJsonGenerator`]; responses are
//! decoded from a parsed `serde_json` document.

mod generator;
mod marshaller;
mod unmarshaller;

pub use generator::{JsonGenerator, JsonProtocolFactory, StructuredJsonGenerator};
pub use marshaller::JsonRequestMarshaller;
pub use unmarshaller::JsonUnmarshaller;
