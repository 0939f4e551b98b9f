//! Converts a Smithy model to a ServiceModel shape table

use super::types::{traits, Member, Shape, SmithyModel, Traits};
use crate::TypeMapper;
use shapewire_common::{
    EnumShape, FieldDescriptor, FieldType, HttpBinding, OperationShape, Protocol, Result,
    ServiceModel, StructureShape, WireError, XmlBinding,
};
use tracing::debug;

/// Convert Smithy model to ServiceModel
pub fn convert_smithy_to_service_model(model: &SmithyModel) -> Result<ServiceModel> {
    // Find service shape
    let (service_id, service_shape) = model.find_service().ok_or_else(|| {
        WireError::Parse("No service shape found in Smithy model".to_string())
    })?;

    let Shape::Service {
        version, traits, ..
    } = service_shape
    else {
        return Err(WireError::Parse(format!("{} is not a service", service_id)));
    };

    let shape_name = SmithyModel::shape_name(service_id);
    let aws_service = traits.get(traits::AWS_SERVICE);
    let service_name = aws_service
        .and_then(|v| v.get("sdkId"))
        .and_then(|v| v.as_str())
        .unwrap_or(shape_name);

    let mut service = ServiceModel::new(service_name, detect_protocol(traits));
    service.target_prefix = shape_name.to_string();
    service.api_version = version.clone();
    service.endpoint_prefix = aws_service
        .and_then(|v| v.get("endpointPrefix"))
        .and_then(|v| v.as_str())
        .map(str::to_string);
    service.xml_namespace = traits
        .get(traits::XML_NAMESPACE)
        .and_then(|v| v.get("uri"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    for (shape_id, shape) in &model.shapes {
        let name = SmithyModel::shape_name(shape_id);
        match shape {
            Shape::Structure { members, traits } | Shape::Union { members, traits } => {
                let structure = convert_structure(model, name, members, traits)?;
                service.structures.insert(name.to_string(), structure);
            },
            Shape::Enum { members, .. } => {
                let values = members.iter().map(|(member_name, member)| {
                    member
                        .string_trait(traits::ENUM_VALUE)
                        .unwrap_or(member_name)
                        .to_string()
                });
                service
                    .enums
                    .insert(name.to_string(), EnumShape::new(name, values));
            },
            Shape::String { traits } => {
                if let Some(values) = legacy_enum_values(traits) {
                    service
                        .enums
                        .insert(name.to_string(), EnumShape::new(name, values));
                }
            },
            Shape::Operation {
                input,
                output,
                traits,
                ..
            } => {
                service.operations.insert(
                    name.to_string(),
                    OperationShape {
                        name: name.to_string(),
                        input: input
                            .as_ref()
                            .map(|r| SmithyModel::shape_name(&r.target).to_string())
                            .filter(|n| n != "Unit"),
                        output: output
                            .as_ref()
                            .map(|r| SmithyModel::shape_name(&r.target).to_string())
                            .filter(|n| n != "Unit"),
                        http: extract_http_binding(traits),
                        documentation: extract_documentation(traits),
                    },
                );
            },
            _ => {},
        }
    }

    debug!(
        service = %service.service_name,
        protocol = %service.protocol,
        structures = service.structures.len(),
        enums = service.enums.len(),
        operations = service.operations.len(),
        "converted Smithy model"
    );

    Ok(service)
}

/// Pick the wire protocol from the service's protocol traits
fn detect_protocol(traits: &Traits) -> Protocol {
    if traits.contains_key(traits::AWS_JSON_1_0) {
        Protocol::AwsJson1_0
    } else if traits.contains_key(traits::AWS_JSON_1_1) {
        Protocol::AwsJson1_1
    } else if traits.contains_key(traits::REST_JSON_1) {
        Protocol::RestJson1
    } else if traits.contains_key(traits::REST_XML) {
        Protocol::RestXml
    } else if traits.contains_key(traits::AWS_QUERY) {
        Protocol::AwsQuery
    } else {
        Protocol::AwsJson1_1
    }
}

/// Build a StructureShape, members in declaration order
fn convert_structure(
    model: &SmithyModel,
    name: &str,
    members: &indexmap::IndexMap<String, Member>,
    shape_traits: &Traits,
) -> Result<StructureShape> {
    let mut structure = StructureShape::new(name);
    structure.documentation = extract_documentation(shape_traits);
    structure.xml_name = shape_traits
        .get(traits::XML_NAME)
        .and_then(|v| v.as_str())
        .map(str::to_string);

    for (member_name, member) in members {
        let field_type = convert_smithy_type_to_field_type(model, &member.target)
            .map_err(|e| WireError::Parse(format!("{}.{}: {}", name, member_name, e)))?;

        let xml = extract_xml_binding(model, member);
        if xml.attribute && !field_type.is_scalar() {
            return Err(WireError::Parse(format!(
                "{}.{}: xmlAttribute member must target a scalar, found {}",
                name, member_name, field_type
            )));
        }

        let mut field = FieldDescriptor::new(member_name.as_str(), field_type).with_xml(xml);
        if let Some(json_name) = member.string_trait(traits::JSON_NAME) {
            field = field.with_json_name(json_name);
        }
        if let Some(xml_name) = member.string_trait(traits::XML_NAME) {
            field = field.with_xml_name(xml_name);
        }
        if member.has_trait(traits::REQUIRED) {
            field = field.required();
        }
        if member.has_trait(traits::HTTP_LABEL) {
            field = field.http_label();
        }
        if let Some(param) = member.string_trait(traits::HTTP_QUERY) {
            field = field.http_query(param);
        }
        if let Some(header) = member.string_trait(traits::HTTP_HEADER) {
            field = field.http_header(header);
        }
        field.documentation = extract_documentation(&member.traits);

        structure.fields.push(field);
    }

    Ok(structure)
}

/// XML placement hints for a member, including element names of the
/// list/map shape it targets
fn extract_xml_binding(model: &SmithyModel, member: &Member) -> XmlBinding {
    let mut xml = XmlBinding {
        attribute: member.has_trait(traits::XML_ATTRIBUTE),
        flattened: member.has_trait(traits::XML_FLATTENED),
        ..XmlBinding::default()
    };

    match model.get_shape(&member.target) {
        Some(Shape::List {
            member: list_member,
            ..
        })
        | Some(Shape::Set {
            member: list_member,
            ..
        }) => {
            if let Some(name) = list_member.string_trait(traits::XML_NAME) {
                xml.member_name = name.to_string();
            }
        },
        Some(Shape::Map { key, value, .. }) => {
            if let Some(name) = key.string_trait(traits::XML_NAME) {
                xml.key_name = name.to_string();
            }
            if let Some(name) = value.string_trait(traits::XML_NAME) {
                xml.value_name = name.to_string();
            }
        },
        _ => {},
    }

    xml
}

/// Convert Smithy type to FieldType
fn convert_smithy_type_to_field_type(model: &SmithyModel, shape_id: &str) -> Result<FieldType> {
    if let Some(field_type) = TypeMapper::map_prelude(shape_id) {
        return Ok(field_type);
    }

    let shape = model
        .get_shape(shape_id)
        .ok_or_else(|| WireError::Parse(format!("Unknown shape {}", shape_id)))?;
    let name = SmithyModel::shape_name(shape_id);

    match shape {
        Shape::Structure { .. } | Shape::Union { .. } => Ok(FieldType::Structure(name.to_string())),
        Shape::Enum { .. } => Ok(FieldType::Enum(name.to_string())),
        Shape::String { traits } if traits.contains_key(traits::ENUM) => {
            Ok(FieldType::Enum(name.to_string()))
        },
        Shape::List { member, .. } | Shape::Set { member, .. } => {
            let inner_type = convert_smithy_type_to_field_type(model, &member.target)?;
            Ok(FieldType::List(Box::new(inner_type)))
        },
        Shape::Map { key, value, .. } => {
            let key_type = convert_smithy_type_to_field_type(model, &key.target)?;
            let value_type = convert_smithy_type_to_field_type(model, &value.target)?;
            Ok(FieldType::Map(Box::new(key_type), Box::new(value_type)))
        },
        other => TypeMapper::map_simple_shape(other).ok_or_else(|| {
            WireError::Parse(format!("Shape {} cannot be used as a member type", shape_id))
        }),
    }
}

/// Values of a Smithy 1.0 `smithy.api#enum` trait
fn legacy_enum_values(traits: &Traits) -> Option<Vec<String>> {
    let entries = traits.get(traits::ENUM)?.as_array()?;
    Some(
        entries
            .iter()
            .filter_map(|entry| entry.get("value").and_then(|v| v.as_str()))
            .map(str::to_string)
            .collect(),
    )
}

fn extract_http_binding(traits: &Traits) -> Option<HttpBinding> {
    let http = traits.get(traits::HTTP)?;
    let method = http.get("method")?.as_str()?;
    let uri = http.get("uri")?.as_str()?;
    Some(HttpBinding {
        method: method.to_string(),
        uri: uri.to_string(),
    })
}

/// Extract documentation from traits
fn extract_documentation(traits: &Traits) -> Option<String> {
    traits
        .get(traits::DOCUMENTATION)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn traits_of(value: serde_json::Value) -> Traits {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_detect_protocol() {
        assert_eq!(
            detect_protocol(&traits_of(json!({"aws.protocols#restXml": {}}))),
            Protocol::RestXml
        );
        assert_eq!(
            detect_protocol(&traits_of(json!({"aws.protocols#awsJson1_0": {}}))),
            Protocol::AwsJson1_0
        );
        assert_eq!(detect_protocol(&HashMap::new()), Protocol::AwsJson1_1);
    }

    #[test]
    fn test_legacy_enum_values() {
        let traits = traits_of(json!({
            "smithy.api#enum": [
                {"value": "ACTIVE", "name": "ACTIVE"},
                {"value": "INACTIVE", "name": "INACTIVE"}
            ]
        }));
        assert_eq!(
            legacy_enum_values(&traits),
            Some(vec!["ACTIVE".to_string(), "INACTIVE".to_string()])
        );
        assert_eq!(legacy_enum_values(&HashMap::new()), None);
    }

    #[test]
    fn test_extract_http_binding() {
        let traits = traits_of(json!({
            "smithy.api#http": {"method": "GET", "uri": "/2013-04-01/trafficpolicy/{Id}/{Version}", "code": 200}
        }));
        let http = extract_http_binding(&traits).unwrap();
        assert_eq!(http.method, "GET");
        assert_eq!(http.uri, "/2013-04-01/trafficpolicy/{Id}/{Version}");
        assert!(extract_http_binding(&HashMap::new()).is_none());
    }

    #[test]
    fn test_extract_documentation() {
        let traits = traits_of(json!({"smithy.api#documentation": "<p>The ID.</p>"}));
        assert_eq!(extract_documentation(&traits).as_deref(), Some("<p>The ID.</p>"));
    }
}
