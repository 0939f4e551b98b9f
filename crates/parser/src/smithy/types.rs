//! Smithy JSON AST type definitions
//!
//! These types represent the structure of Smithy JSON files. Structure and
//! enum members keep their declaration order, which drives marshalling order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trait map attached to shapes and members
pub type Traits = HashMap<String, serde_json::Value>;

/// Root Smithy model document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmithyModel {
    /// Smithy version (e.g., "2.0")
    pub smithy: String,

    /// Shape definitions (operations, structures, services, etc.)
    #[serde(default)]
    pub shapes: HashMap<String, Shape>,

    /// Metadata about the model
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A Smithy shape (can be service, operation, structure, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// Service definition
    Service {
        /// API version
        #[serde(default)]
        version: Option<String>,

        /// Operations exposed by this service
        #[serde(default)]
        operations: Vec<ShapeReference>,

        /// Resources managed by this service
        #[serde(default)]
        resources: Vec<ShapeReference>,

        #[serde(default)]
        traits: Traits,
    },

    /// Operation definition
    Operation {
        /// Input shape
        #[serde(default)]
        input: Option<ShapeReference>,

        /// Output shape
        #[serde(default)]
        output: Option<ShapeReference>,

        /// Error shapes
        #[serde(default)]
        errors: Vec<ShapeReference>,

        #[serde(default)]
        traits: Traits,
    },

    /// Structure definition (input/output types)
    Structure {
        /// Member fields, in declaration order
        #[serde(default)]
        members: IndexMap<String, Member>,

        #[serde(default)]
        traits: Traits,
    },

    /// Tagged union; only one member is set at a time
    Union {
        #[serde(default)]
        members: IndexMap<String, Member>,

        #[serde(default)]
        traits: Traits,
    },

    /// Smithy 2.0 string enum
    Enum {
        #[serde(default)]
        members: IndexMap<String, Member>,

        #[serde(default)]
        traits: Traits,
    },

    /// Smithy 2.0 integer enum
    #[serde(rename = "intEnum")]
    IntEnum {
        #[serde(default)]
        traits: Traits,
    },

    /// String type; Smithy 1.0 enums are strings carrying the enum trait
    String {
        #[serde(default)]
        traits: Traits,
    },

    Byte {
        #[serde(default)]
        traits: Traits,
    },

    Short {
        #[serde(default)]
        traits: Traits,
    },

    Integer {
        #[serde(default)]
        traits: Traits,
    },

    Long {
        #[serde(default)]
        traits: Traits,
    },

    Boolean {
        #[serde(default)]
        traits: Traits,
    },

    Float {
        #[serde(default)]
        traits: Traits,
    },

    Double {
        #[serde(default)]
        traits: Traits,
    },

    #[serde(rename = "bigInteger")]
    BigInteger {
        #[serde(default)]
        traits: Traits,
    },

    #[serde(rename = "bigDecimal")]
    BigDecimal {
        #[serde(default)]
        traits: Traits,
    },

    Timestamp {
        #[serde(default)]
        traits: Traits,
    },

    /// Binary data, carried as base64 text
    Blob {
        #[serde(default)]
        traits: Traits,
    },

    Document {
        #[serde(default)]
        traits: Traits,
    },

    /// List type
    List {
        /// Member type
        member: Member,

        #[serde(default)]
        traits: Traits,
    },

    /// Set type (Smithy 1.0)
    Set {
        member: Member,

        #[serde(default)]
        traits: Traits,
    },

    /// Map type
    Map {
        /// Key type
        key: Member,

        /// Value type
        value: Member,

        #[serde(default)]
        traits: Traits,
    },

    /// Fallback for other shape types (resources, etc.)
    #[serde(other)]
    Other,
}

impl Shape {
    /// Traits of this shape, if its kind carries any
    pub fn traits(&self) -> Option<&Traits> {
        match self {
            Shape::Service { traits, .. }
            | Shape::Operation { traits, .. }
            | Shape::Structure { traits, .. }
            | Shape::Union { traits, .. }
            | Shape::Enum { traits, .. }
            | Shape::IntEnum { traits }
            | Shape::String { traits }
            | Shape::Byte { traits }
            | Shape::Short { traits }
            | Shape::Integer { traits }
            | Shape::Long { traits }
            | Shape::Boolean { traits }
            | Shape::Float { traits }
            | Shape::Double { traits }
            | Shape::BigInteger { traits }
            | Shape::BigDecimal { traits }
            | Shape::Timestamp { traits }
            | Shape::Blob { traits }
            | Shape::Document { traits }
            | Shape::List { traits, .. }
            | Shape::Set { traits, .. }
            | Shape::Map { traits, .. } => Some(traits),
            Shape::Other => None,
        }
    }
}

/// Reference to another shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeReference {
    /// Target shape ID (e.g., "com.amazonaws.route53#TrafficPolicy")
    pub target: String,
}

/// Structure, list or map member definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Target shape for this member
    pub target: String,

    #[serde(default)]
    pub traits: Traits,
}

impl Member {
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.contains_key(name)
    }

    /// String-valued trait (e.g., `smithy.api#xmlName`)
    pub fn string_trait(&self, name: &str) -> Option<&str> {
        self.traits.get(name).and_then(|v| v.as_str())
    }
}

impl SmithyModel {
    /// Find the service shape in the model
    pub fn find_service(&self) -> Option<(&String, &Shape)> {
        self.shapes
            .iter()
            .find(|(_, shape)| matches!(shape, Shape::Service { .. }))
    }

    /// Get a shape by its ID
    pub fn get_shape(&self, shape_id: &str) -> Option<&Shape> {
        self.shapes.get(shape_id)
    }

    /// Strip the namespace from a shape ID
    /// e.g., "com.amazonaws.route53#GetTrafficPolicy" -> "GetTrafficPolicy"
    pub fn shape_name(shape_id: &str) -> &str {
        match shape_id.rfind('#') {
            Some(hash_pos) => &shape_id[hash_pos + 1..],
            None => shape_id,
        }
    }
}

/// Common Smithy trait names
pub mod traits {
    pub const DOCUMENTATION: &str = "smithy.api#documentation";
    pub const REQUIRED: &str = "smithy.api#required";
    pub const ENUM: &str = "smithy.api#enum";
    pub const ENUM_VALUE: &str = "smithy.api#enumValue";
    pub const HTTP: &str = "smithy.api#http";
    pub const HTTP_LABEL: &str = "smithy.api#httpLabel";
    pub const HTTP_QUERY: &str = "smithy.api#httpQuery";
    pub const HTTP_HEADER: &str = "smithy.api#httpHeader";
    pub const JSON_NAME: &str = "smithy.api#jsonName";
    pub const XML_NAME: &str = "smithy.api#xmlName";
    pub const XML_ATTRIBUTE: &str = "smithy.api#xmlAttribute";
    pub const XML_FLATTENED: &str = "smithy.api#xmlFlattened";
    pub const XML_NAMESPACE: &str = "smithy.api#xmlNamespace";
    pub const AWS_SERVICE: &str = "aws.api#service";
    pub const AWS_JSON_1_0: &str = "aws.protocols#awsJson1_0";
    pub const AWS_JSON_1_1: &str = "aws.protocols#awsJson1_1";
    pub const REST_JSON_1: &str = "aws.protocols#restJson1";
    pub const REST_XML: &str = "aws.protocols#restXml";
    pub const AWS_QUERY: &str = "aws.protocols#awsQuery";
}
