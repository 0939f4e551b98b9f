//! Type mapping from Smithy simple shapes to field types
//!
//! Maps prelude targets (`smithy.api#String`, ...) and simple shape kinds to
//! the `FieldType` the codec understands.

use crate::smithy::Shape;
use shapewire_common::FieldType;

/// Maps Smithy simple types to FieldType
pub struct TypeMapper;

impl TypeMapper {
    /// Map a prelude shape ID to FieldType
    ///
    /// # Examples
    /// ```
    /// use shapewire_parser::TypeMapper;
    /// use shapewire_common::FieldType;
    ///
    /// assert_eq!(TypeMapper::map_prelude("smithy.api#String"), Some(FieldType::String));
    /// assert_eq!(TypeMapper::map_prelude("smithy.api#PrimitiveLong"), Some(FieldType::Long));
    /// assert_eq!(TypeMapper::map_prelude("com.example#Custom"), None);
    /// ```
    pub fn map_prelude(shape_id: &str) -> Option<FieldType> {
        let name = shape_id.strip_prefix("smithy.api#")?;
        // PrimitiveX prelude shapes only differ in their default value
        let name = name.strip_prefix("Primitive").unwrap_or(name);

        match name {
            "String" | "Blob" | "Document" | "BigInteger" | "BigDecimal" => Some(FieldType::String),
            "Byte" | "Short" | "Integer" => Some(FieldType::Integer),
            "Long" => Some(FieldType::Long),
            "Boolean" => Some(FieldType::Boolean),
            "Float" | "Double" => Some(FieldType::Double),
            "Timestamp" => Some(FieldType::Timestamp),
            _ => None,
        }
    }

    /// Map a simple (non-aggregate) shape to FieldType
    ///
    /// Returns `None` for aggregate shapes, enums and anything else the caller
    /// has to resolve by name.
    pub fn map_simple_shape(shape: &Shape) -> Option<FieldType> {
        match shape {
            Shape::String { .. }
            | Shape::Blob { .. }
            | Shape::Document { .. }
            | Shape::BigInteger { .. }
            | Shape::BigDecimal { .. } => Some(FieldType::String),
            Shape::Byte { .. } | Shape::Short { .. } | Shape::Integer { .. } | Shape::IntEnum { .. } => {
                Some(FieldType::Integer)
            },
            Shape::Long { .. } => Some(FieldType::Long),
            Shape::Boolean { .. } => Some(FieldType::Boolean),
            Shape::Float { .. } | Shape::Double { .. } => Some(FieldType::Double),
            Shape::Timestamp { .. } => Some(FieldType::Timestamp),
            _ => None,
        }
    }
}
