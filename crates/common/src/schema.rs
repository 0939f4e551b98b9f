//! Shape tables
//!
//! A [`ServiceModel`] is the descriptor table the generic marshallers and
//! unmarshallers interpret. It is built once (usually by the Smithy parser)
//! and only read afterwards.

use crate::{enums, FieldType, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wire protocol spoken by a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Protocol {
    AwsJson1_0,
    AwsJson1_1,
    RestJson1,
    RestXml,
    AwsQuery,
}

impl Protocol {
    /// JSON dialect version carried in the content type, if this is a JSON protocol
    pub fn json_version(&self) -> Option<&'static str> {
        match self {
            Protocol::AwsJson1_0 => Some("1.0"),
            Protocol::AwsJson1_1 | Protocol::RestJson1 => Some("1.1"),
            Protocol::RestXml | Protocol::AwsQuery => None,
        }
    }

    pub fn is_json(&self) -> bool {
        self.json_version().is_some()
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::AwsJson1_0 => write!(f, "awsJson1_0"),
            Protocol::AwsJson1_1 => write!(f, "awsJson1_1"),
            Protocol::RestJson1 => write!(f, "restJson1"),
            Protocol::RestXml => write!(f, "restXml"),
            Protocol::AwsQuery => write!(f, "awsQuery"),
        }
    }
}

/// XML placement of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlBinding {
    /// Serialized as an attribute of the enclosing element
    pub attribute: bool,
    /// List/map entries appear directly under the parent, without a wrapper element
    pub flattened: bool,
    /// Element name of list members
    pub member_name: String,
    /// Element names of map entries
    pub entry_name: String,
    pub key_name: String,
    pub value_name: String,
}

impl Default for XmlBinding {
    fn default() -> Self {
        Self {
            attribute: false,
            flattened: false,
            member_name: "member".to_string(),
            entry_name: "entry".to_string(),
            key_name: "key".to_string(),
            value_name: "value".to_string(),
        }
    }
}

/// One member of a structure shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Member name, also the key in a [`crate::Model`]
    pub name: String,
    /// Key used in JSON payloads
    pub json_name: String,
    /// Element or attribute name used in XML payloads
    pub xml_name: String,
    pub field_type: FieldType,
    pub required: bool,
    /// Bound to a `{Label}` in the request URI rather than the body
    pub http_label: bool,
    /// Query-string parameter name, for members sent in the URI query
    pub http_query: Option<String>,
    /// Header name, for members sent as HTTP headers
    pub http_header: Option<String>,
    pub xml: XmlBinding,
    pub documentation: Option<String>,
}

impl FieldDescriptor {
    /// Descriptor whose wire names equal the member name
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            json_name: name.clone(),
            xml_name: name.clone(),
            name,
            field_type,
            required: false,
            http_label: false,
            http_query: None,
            http_header: None,
            xml: XmlBinding::default(),
            documentation: None,
        }
    }

    pub fn with_json_name(mut self, json_name: impl Into<String>) -> Self {
        self.json_name = json_name.into();
        self
    }

    pub fn with_xml_name(mut self, xml_name: impl Into<String>) -> Self {
        self.xml_name = xml_name.into();
        self
    }

    pub fn with_xml(mut self, xml: XmlBinding) -> Self {
        self.xml = xml;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn http_label(mut self) -> Self {
        self.http_label = true;
        self
    }

    pub fn http_query(mut self, param: impl Into<String>) -> Self {
        self.http_query = Some(param.into());
        self
    }

    pub fn http_header(mut self, header: impl Into<String>) -> Self {
        self.http_header = Some(header.into());
        self
    }

    /// Carried in the payload rather than the URI or headers
    pub fn is_body(&self) -> bool {
        !self.http_label && self.http_query.is_none() && self.http_header.is_none()
    }
}

/// Structure shape: an ordered list of field descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureShape {
    pub name: String,
    /// Root element name when this shape is an XML document body
    pub xml_name: Option<String>,
    /// Fields in declaration order
    pub fields: Vec<FieldDescriptor>,
    pub documentation: Option<String>,
}

impl StructureShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            xml_name: None,
            fields: Vec::new(),
            documentation: None,
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_json_name(&self, json_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.json_name == json_name)
    }

    /// Element name of the document root when this shape is serialized as XML
    pub fn root_element(&self) -> &str {
        self.xml_name.as_deref().unwrap_or(&self.name)
    }
}

/// Enum shape: a closed set of string tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumShape {
    pub name: String,
    pub values: Vec<String>,
}

impl EnumShape {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve `value` to its declared token
    ///
    /// Matching is exact; absent, empty and unknown tokens are invalid arguments.
    pub fn from_value(&self, value: Option<&str>) -> Result<&str> {
        let token = enums::require_token(value)?;
        self.values
            .iter()
            .find(|v| v.as_str() == token)
            .map(String::as_str)
            .ok_or_else(|| enums::unknown_token(token))
    }
}

/// HTTP binding of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpBinding {
    pub method: String,
    pub uri: String,
}

impl Default for HttpBinding {
    fn default() -> Self {
        Self {
            method: "POST".to_string(),
            uri: "/".to_string(),
        }
    }
}

/// Operation shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationShape {
    pub name: String,
    pub input: Option<String>,
    pub output: Option<String>,
    pub http: Option<HttpBinding>,
    pub documentation: Option<String>,
}

/// All shapes of one service plus its protocol metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceModel {
    /// Service name (e.g., "DataPipeline", "Route 53")
    pub service_name: String,
    /// Prefix of the `X-Amz-Target` header (e.g., "DataPipeline")
    pub target_prefix: String,
    pub protocol: Protocol,
    /// Overrides the protocol's JSON version when set
    pub json_version: Option<String>,
    pub xml_namespace: Option<String>,
    pub endpoint_prefix: Option<String>,
    pub api_version: Option<String>,
    pub structures: BTreeMap<String, StructureShape>,
    pub enums: BTreeMap<String, EnumShape>,
    pub operations: BTreeMap<String, OperationShape>,
}

impl ServiceModel {
    pub fn new(service_name: impl Into<String>, protocol: Protocol) -> Self {
        let service_name = service_name.into();
        Self {
            target_prefix: service_name.clone(),
            service_name,
            protocol,
            json_version: None,
            xml_namespace: None,
            endpoint_prefix: None,
            api_version: None,
            structures: BTreeMap::new(),
            enums: BTreeMap::new(),
            operations: BTreeMap::new(),
        }
    }

    pub fn with_structure(mut self, shape: StructureShape) -> Self {
        self.structures.insert(shape.name.clone(), shape);
        self
    }

    pub fn with_enum(mut self, shape: EnumShape) -> Self {
        self.enums.insert(shape.name.clone(), shape);
        self
    }

    pub fn with_operation(mut self, operation: OperationShape) -> Self {
        self.operations.insert(operation.name.clone(), operation);
        self
    }

    pub fn structure(&self, name: &str) -> Option<&StructureShape> {
        self.structures.get(name)
    }

    pub fn enum_shape(&self, name: &str) -> Option<&EnumShape> {
        self.enums.get(name)
    }

    pub fn operation(&self, name: &str) -> Option<&OperationShape> {
        self.operations.get(name)
    }

    /// Effective JSON version: explicit override, then the protocol default
    pub fn json_version(&self) -> &str {
        self.json_version
            .as_deref()
            .or_else(|| self.protocol.json_version())
            .unwrap_or("1.1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WireError;

    fn availability() -> EnumShape {
        EnumShape::new("DomainAvailability", ["AVAILABLE", "UNAVAILABLE", "DONT_KNOW"])
    }

    #[test]
    fn test_enum_shape_lookup_is_exact() {
        let shape = availability();
        assert_eq!(shape.from_value(Some("AVAILABLE")).unwrap(), "AVAILABLE");
        assert_eq!(shape.from_value(Some("DONT_KNOW")).unwrap(), "DONT_KNOW");

        for bad in [None, Some(""), Some("available"), Some("AVAIL"), Some("UNKNOWN_TOKEN")] {
            let err = shape.from_value(bad).unwrap_err();
            assert!(matches!(err, WireError::InvalidArgument(_)), "{:?}", bad);
        }
    }

    #[test]
    fn test_enum_error_messages() {
        let shape = availability();
        assert_eq!(
            shape.from_value(Some("")).unwrap_err().to_string(),
            "Value cannot be null or empty!"
        );
        assert_eq!(
            shape.from_value(Some("UNKNOWN_TOKEN")).unwrap_err().to_string(),
            "Cannot create enum from UNKNOWN_TOKEN value!"
        );
    }

    #[test]
    fn test_structure_field_lookup() {
        let shape = StructureShape::new("TrafficPolicy")
            .with_field(FieldDescriptor::new("Id", FieldType::String).required())
            .with_field(FieldDescriptor::new("Version", FieldType::Integer).with_json_name("version"));

        assert!(shape.field("Id").unwrap().required);
        assert_eq!(shape.field_by_json_name("version").unwrap().name, "Version");
        assert!(shape.field("Missing").is_none());
        assert_eq!(shape.root_element(), "TrafficPolicy");
        assert!(shape.fields.iter().all(FieldDescriptor::is_body));

        let marker = FieldDescriptor::new("Marker", FieldType::String).http_query("marker");
        assert!(!marker.is_body());
        assert!(!FieldDescriptor::new("Id", FieldType::String).http_label().is_body());
    }

    #[test]
    fn test_json_version_resolution() {
        let mut model = ServiceModel::new("DataPipeline", Protocol::AwsJson1_1);
        assert_eq!(model.json_version(), "1.1");
        assert_eq!(model.target_prefix, "DataPipeline");

        model.protocol = Protocol::AwsJson1_0;
        assert_eq!(model.json_version(), "1.0");

        model.json_version = Some("1.2".to_string());
        assert_eq!(model.json_version(), "1.2");
    }

    #[test]
    fn test_protocol_serde_names() {
        let p: Protocol = serde_json::from_str("\"restXml\"").unwrap();
        assert_eq!(p, Protocol::RestXml);
        assert!(!p.is_json());
        assert_eq!(serde_json::to_string(&Protocol::AwsJson1_1).unwrap(), "\"awsJson1_1\"");
    }
}
