//! Integration tests for the Smithy parser

use shapewire_common::{FieldType, Protocol};
use shapewire_parser::{load_service_model, smithy::SmithyParser};
use std::io::Write;

const DATAPIPELINE: &str = include_str!("../../../models/datapipeline.json");
const ROUTE53: &str = include_str!("../../../models/route53.json");
const IOT: &str = include_str!("../../../models/iot.json");

#[test]
fn test_parse_json_protocol_service() {
    let service = SmithyParser::from_json(DATAPIPELINE)
        .unwrap()
        .parse()
        .unwrap();

    assert_eq!(service.service_name, "Data Pipeline");
    assert_eq!(service.target_prefix, "DataPipeline");
    assert_eq!(service.protocol, Protocol::AwsJson1_1);
    assert_eq!(service.json_version(), "1.1");
    assert_eq!(service.endpoint_prefix.as_deref(), Some("datapipeline"));
    assert_eq!(service.api_version.as_deref(), Some("2012-10-29"));

    let op = service.operation("QueryObjects").expect("QueryObjects operation");
    assert_eq!(op.input.as_deref(), Some("QueryObjectsInput"));
    assert_eq!(op.output.as_deref(), Some("QueryObjectsOutput"));
    assert!(op.http.is_none());
}

#[test]
fn test_fields_follow_declaration_order() {
    let service = SmithyParser::from_json(DATAPIPELINE)
        .unwrap()
        .parse()
        .unwrap();

    let input = service.structure("QueryObjectsInput").unwrap();
    let names: Vec<&str> = input.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["pipelineId", "query", "sphere", "marker", "limit"]);

    let pipeline_id = input.field("pipelineId").unwrap();
    assert!(pipeline_id.required);
    assert_eq!(pipeline_id.field_type, FieldType::String);
    assert_eq!(
        pipeline_id.documentation.as_deref(),
        Some("<p>The ID of the pipeline.</p>")
    );
    assert_eq!(
        input.field("query").unwrap().field_type,
        FieldType::Structure("Query".to_string())
    );
    assert_eq!(input.field("limit").unwrap().field_type, FieldType::Integer);
    assert!(!input.field("marker").unwrap().required);
}

#[test]
fn test_nested_lists_and_enums() {
    let service = SmithyParser::from_json(DATAPIPELINE)
        .unwrap()
        .parse()
        .unwrap();

    let query = service.structure("Query").unwrap();
    assert_eq!(
        query.field("selectors").unwrap().field_type,
        FieldType::List(Box::new(FieldType::Structure("Selector".to_string())))
    );

    let operator = service.structure("Operator").unwrap();
    assert_eq!(
        operator.field("type").unwrap().field_type,
        FieldType::Enum("OperatorType".to_string())
    );

    let operator_type = service.enum_shape("OperatorType").unwrap();
    assert_eq!(operator_type.values, vec!["EQ", "REF_EQ", "LE", "GE", "BETWEEN"]);
    assert_eq!(operator_type.from_value(Some("REF_EQ")).unwrap(), "REF_EQ");
    assert!(operator_type.from_value(Some("ReferenceEqual")).is_err());
}

#[test]
fn test_parse_rest_xml_service() {
    let service = SmithyParser::from_json(ROUTE53).unwrap().parse().unwrap();

    assert_eq!(service.service_name, "Route 53");
    assert_eq!(service.target_prefix, "AWSDnsV20130401");
    assert_eq!(service.protocol, Protocol::RestXml);
    assert_eq!(
        service.xml_namespace.as_deref(),
        Some("https://route53.amazonaws.com/doc/2013-04-01/")
    );

    let op = service.operation("GetTrafficPolicy").unwrap();
    let http = op.http.as_ref().unwrap();
    assert_eq!(http.method, "GET");
    assert_eq!(http.uri, "/2013-04-01/trafficpolicy/{Id}/{Version}");

    let request = service.structure("GetTrafficPolicyRequest").unwrap();
    assert!(request.fields.iter().all(|f| f.http_label));

    let create = service.structure("CreateTrafficPolicyRequest").unwrap();
    assert_eq!(create.root_element(), "CreateTrafficPolicyRequest");
}

#[test]
fn test_list_member_xml_name() {
    let service = SmithyParser::from_json(ROUTE53).unwrap().parse().unwrap();

    let response = service.structure("ListTrafficPoliciesResponse").unwrap();
    let summaries = response.field("TrafficPolicySummaries").unwrap();
    assert_eq!(summaries.xml.member_name, "TrafficPolicySummary");
    assert!(!summaries.xml.flattened);
    assert_eq!(
        response.field("IsTruncated").unwrap().field_type,
        FieldType::Boolean
    );
}

#[test]
fn test_legacy_enum_trait_and_timestamps() {
    let service = SmithyParser::from_json(IOT).unwrap().parse().unwrap();

    assert_eq!(service.protocol, Protocol::RestJson1);
    let status = service.enum_shape("CACertificateStatus").unwrap();
    assert_eq!(status.values, vec!["ACTIVE", "INACTIVE"]);

    let certificate = service.structure("CACertificate").unwrap();
    assert_eq!(
        certificate.field("status").unwrap().field_type,
        FieldType::Enum("CACertificateStatus".to_string())
    );
    assert_eq!(
        certificate.field("creationDate").unwrap().field_type,
        FieldType::Timestamp
    );
    assert_eq!(
        certificate.documentation.as_deref(),
        Some("<p>A CA certificate.</p>")
    );
}

#[test]
fn test_member_traits_become_wire_names() {
    let smithy_json = r#"{
        "smithy": "2.0",
        "shapes": {
            "com.example#Svc": {
                "type": "service",
                "traits": { "aws.protocols#awsJson1_0": {} }
            },
            "com.example#Item": {
                "type": "structure",
                "members": {
                    "ItemId": {
                        "target": "smithy.api#String",
                        "traits": {
                            "smithy.api#jsonName": "itemId",
                            "smithy.api#xmlName": "item-id",
                            "smithy.api#xmlAttribute": {}
                        }
                    },
                    "Labels": {
                        "target": "com.example#Labels",
                        "traits": { "smithy.api#xmlFlattened": {} }
                    },
                    "Counts": { "target": "com.example#Counts" }
                }
            },
            "com.example#Labels": {
                "type": "list",
                "member": { "target": "smithy.api#String" }
            },
            "com.example#Counts": {
                "type": "map",
                "key": { "target": "smithy.api#String", "traits": { "smithy.api#xmlName": "Name" } },
                "value": { "target": "smithy.api#Long", "traits": { "smithy.api#xmlName": "Count" } }
            }
        }
    }"#;

    let service = SmithyParser::from_json(smithy_json).unwrap().parse().unwrap();
    assert_eq!(service.protocol, Protocol::AwsJson1_0);
    assert_eq!(service.service_name, "Svc");

    let item = service.structure("Item").unwrap();
    let id = item.field("ItemId").unwrap();
    assert_eq!(id.json_name, "itemId");
    assert_eq!(id.xml_name, "item-id");
    assert!(id.xml.attribute);
    assert!(item.field("Labels").unwrap().xml.flattened);

    let counts = item.field("Counts").unwrap();
    assert_eq!(
        counts.field_type,
        FieldType::Map(Box::new(FieldType::String), Box::new(FieldType::Long))
    );
    assert_eq!(counts.xml.key_name, "Name");
    assert_eq!(counts.xml.value_name, "Count");
}

#[test]
fn test_missing_member_target_is_an_error() {
    let smithy_json = r#"{
        "smithy": "2.0",
        "shapes": {
            "com.example#Svc": { "type": "service" },
            "com.example#Broken": {
                "type": "structure",
                "members": { "x": { "target": "com.example#Nowhere" } }
            }
        }
    }"#;

    let err = SmithyParser::from_json(smithy_json)
        .unwrap()
        .parse()
        .unwrap_err();
    assert!(err.to_string().contains("Broken.x"));
    assert!(err.to_string().contains("com.example#Nowhere"));
}

#[test]
fn test_attribute_on_structure_member_is_an_error() {
    let smithy_json = r#"{
        "smithy": "2.0",
        "shapes": {
            "com.example#Svc": { "type": "service" },
            "com.example#Inner": { "type": "structure", "members": {} },
            "com.example#Outer": {
                "type": "structure",
                "members": {
                    "inner": {
                        "target": "com.example#Inner",
                        "traits": { "smithy.api#xmlAttribute": {} }
                    }
                }
            }
        }
    }"#;

    let err = SmithyParser::from_json(smithy_json)
        .unwrap()
        .parse()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parse error: Outer.inner: xmlAttribute member must target a scalar, found Inner"
    );
}

#[test]
fn test_model_without_service_is_rejected() {
    let smithy_json = r#"{ "smithy": "2.0", "shapes": {} }"#;
    let err = SmithyParser::from_json(smithy_json)
        .unwrap()
        .parse()
        .unwrap_err();
    assert!(err.to_string().contains("No service shape"));
}

#[test]
fn test_load_service_model_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DATAPIPELINE.as_bytes()).unwrap();

    let service = load_service_model(file.path()).unwrap();
    assert!(service.structure("Tag").is_some());
    assert_eq!(service.operations.len(), 2);
}
