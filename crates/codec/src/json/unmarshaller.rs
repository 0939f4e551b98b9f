use crate::{structure, timestamp, CodecError, Result};
use serde_json::Value as JsonValue;
use shapewire_common::{FieldType, Model, ServiceModel, StructureShape, Value};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Decodes JSON documents into models of one service
#[derive(Debug, Clone, Copy)]
pub struct JsonUnmarshaller<'a> {
    service: &'a ServiceModel,
}

impl<'a> JsonUnmarshaller<'a> {
    pub fn new(service: &'a ServiceModel) -> Self {
        Self { service }
    }

    /// Decode `body` as an instance of the structure shape `shape_name`
    ///
    /// An empty (or whitespace-only) body decodes to an empty model.
    pub fn unmarshall(&self, shape_name: &str, body: &[u8]) -> Result<Model> {
        let shape = structure(self.service, shape_name)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Model::new(&shape.name));
        }

        let document: JsonValue = serde_json::from_slice(body)?;
        let model = self.unmarshall_value(shape, &document)?;
        debug!(shape = %shape.name, fields = model.len(), "Unmarshalled JSON document");
        Ok(model)
    }

    /// Decode an already parsed JSON object
    pub fn unmarshall_value(&self, shape: &StructureShape, document: &JsonValue) -> Result<Model> {
        let object = document
            .as_object()
            .ok_or_else(|| mismatch(&shape.name, "object", document))?;

        let mut model = Model::new(&shape.name);
        for (key, value) in object {
            let Some(field) = shape.field_by_json_name(key) else {
                trace!(shape = %shape.name, key = %key, "Skipping unknown key");
                continue;
            };
            if value.is_null() {
                continue;
            }
            let decoded = self.read_value(&field.name, &field.field_type, value)?;
            model.set(&field.name, decoded);
        }
        Ok(model)
    }

    fn read_value(&self, field: &str, field_type: &FieldType, value: &JsonValue) -> Result<Value> {
        let decoded = match field_type {
            FieldType::String | FieldType::Enum(_) => value.as_str().map(Value::from),
            FieldType::Integer => value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::Integer),
            FieldType::Long => value.as_i64().map(Value::Long),
            FieldType::Boolean => value.as_bool().map(Value::Boolean),
            FieldType::Double => value.as_f64().map(Value::Double),
            FieldType::Timestamp => match value {
                JsonValue::String(text) => Some(Value::Timestamp(timestamp::parse_iso8601(text)?)),
                _ => value
                    .as_f64()
                    .and_then(timestamp::from_epoch_seconds)
                    .map(Value::Timestamp),
            },
            FieldType::Structure(name) => {
                let shape = structure(self.service, name)?;
                return Ok(Value::Structure(self.unmarshall_value(shape, value)?));
            },
            FieldType::List(member) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| mismatch(field, "array", value))?;
                let decoded = items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| self.read_value(field, member, item))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(Value::List(decoded));
            },
            FieldType::Map(_, member) => {
                let entries = value
                    .as_object()
                    .ok_or_else(|| mismatch(field, "object", value))?;
                let mut decoded = BTreeMap::new();
                for (key, item) in entries {
                    if !item.is_null() {
                        decoded.insert(key.clone(), self.read_value(field, member, item)?);
                    }
                }
                return Ok(Value::Map(decoded));
            },
        };

        decoded.ok_or_else(|| mismatch(field, &field_type.to_string(), value))
    }
}

fn mismatch(field: &str, expected: &str, found: &JsonValue) -> CodecError {
    let found = match found {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    };
    CodecError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}
