//! Smithy specification parser
//!
//! Parses the Smithy JSON AST format into a [`shapewire_common::ServiceModel`].
//!
//! Smithy specs are available at: https://github.com/aws/api-models-aws
//!
//! ## Format
//! Smithy JSON AST contains:
//! - Service definitions with operations and protocol traits
//! - Shape definitions (structures, enums, lists, maps, primitives)
//! - Traits (documentation, wire names, HTTP bindings)
//!
//! ## Usage
//! ```rust,ignore
//! use shapewire_parser::smithy::SmithyParser;
//!
//! let parser = SmithyParser::from_file("datapipeline-2012-10-29.json")?;
//! let service = parser.parse()?;
//! ```

mod converter;
mod parser;
mod types;

pub use parser::SmithyParser;
pub use types::*;
