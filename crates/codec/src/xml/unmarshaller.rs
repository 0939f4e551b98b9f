use super::context::{XmlEvent, XmlUnmarshallerContext};
use crate::{structure, timestamp, CodecError, Result};
use shapewire_common::{
    FieldDescriptor, FieldType, Model, ServiceModel, StructureShape, Value, XmlBinding,
};
use std::collections::BTreeMap;
use std::io::BufRead;
use tracing::{debug, trace, warn};

/// Decode an XML document into an instance of `shape_name`
///
/// The document's root element is the response wrapper; the shape's fields
/// are expected directly beneath it.
pub fn unmarshall_xml(service: &ServiceModel, shape_name: &str, body: &[u8]) -> Result<Model> {
    let unmarshaller = StructureUnmarshaller::for_shape(service, shape_name)?;
    let mut context = XmlUnmarshallerContext::from_bytes(body);
    unmarshaller.unmarshall(&mut context)
}

/// Unmarshaller for one structure shape
///
/// Stateless apart from the borrowed shape tables, so one instance can be
/// reused for any number of documents.
#[derive(Debug, Clone, Copy)]
pub struct StructureUnmarshaller<'a> {
    service: &'a ServiceModel,
    shape: &'a StructureShape,
}

impl<'a> StructureUnmarshaller<'a> {
    pub fn new(service: &'a ServiceModel, shape: &'a StructureShape) -> Self {
        Self { service, shape }
    }

    pub fn for_shape(service: &'a ServiceModel, shape_name: &str) -> Result<Self> {
        Ok(Self::new(service, structure(service, shape_name)?))
    }

    /// Consume events until the end of the current element and return the populated model
    ///
    /// The cursor must sit on the start element of this structure, or at the
    /// start of the document. Elements that match no field are skipped. If the
    /// document ends before the structure is closed, whatever was read so far
    /// is returned.
    pub fn unmarshall<R: BufRead>(&self, context: &mut XmlUnmarshallerContext<R>) -> Result<Model> {
        let mut model = Model::new(&self.shape.name);
        let original_depth = context.current_depth();
        let mut target_depth = original_depth + 1;
        if context.is_start_of_document() {
            target_depth += 1;
        }

        loop {
            match context.next_event()? {
                XmlEvent::EndDocument => {
                    if context.current_depth() > 0 {
                        warn!(
                            shape = %self.shape.name,
                            depth = context.current_depth(),
                            "Document ended inside an open element, returning partial result"
                        );
                    }
                    return Ok(model);
                },
                XmlEvent::StartElement { .. } | XmlEvent::Attribute { .. } => {
                    self.read_field(context, &mut model, target_depth)?;
                },
                XmlEvent::EndElement { .. } => {
                    if context.current_depth() < original_depth {
                        debug!(shape = %self.shape.name, fields = model.len(), "Unmarshalled XML structure");
                        return Ok(model);
                    }
                },
                XmlEvent::Characters(_) => {},
            }
        }
    }

    /// Match the current event against every field and read the first hit
    fn read_field<R: BufRead>(
        &self,
        context: &mut XmlUnmarshallerContext<R>,
        model: &mut Model,
        target_depth: usize,
    ) -> Result<()> {
        for field in &self.shape.fields {
            if field.xml.attribute {
                // attributes belong to this structure's own element
                let expression = format!("@{}", field.xml_name);
                if context.test_expression(&expression, target_depth - 1) {
                    let text = context.read_text()?;
                    model.set(&field.name, parse_scalar(&field.name, &field.field_type, &text)?);
                    return Ok(());
                }
                continue;
            }

            let matched = match &field.field_type {
                FieldType::List(member) => self.read_list_field(context, model, field, member, target_depth)?,
                FieldType::Map(_, value) => self.read_map_field(context, model, field, value, target_depth)?,
                field_type => {
                    if context.test_expression(&field.xml_name, target_depth) {
                        let value = read_value(self.service, context, &field.name, field_type)?;
                        model.set(&field.name, value);
                        true
                    } else {
                        false
                    }
                },
            };
            if matched {
                return Ok(());
            }
        }

        if let Some(XmlEvent::StartElement { name, .. }) = context.current_event() {
            trace!(shape = %self.shape.name, element = %name, "No field matched element");
        }
        Ok(())
    }

    fn read_list_field<R: BufRead>(
        &self,
        context: &mut XmlUnmarshallerContext<R>,
        model: &mut Model,
        field: &FieldDescriptor,
        member: &FieldType,
        target_depth: usize,
    ) -> Result<bool> {
        if field.xml.flattened {
            if context.test_expression(&field.xml_name, target_depth) {
                let item = read_value(self.service, context, &field.name, member)?;
                push_item(model, &field.name, item);
                return Ok(true);
            }
            return Ok(false);
        }

        if context.test_expression(&field.xml_name, target_depth) {
            if !model.is_set(&field.name) {
                model.set(&field.name, Value::List(Vec::new()));
            }
            return Ok(true);
        }
        let member_path = format!("{}/{}", field.xml_name, field.xml.member_name);
        if context.test_expression(&member_path, target_depth) {
            let item = read_value(self.service, context, &field.name, member)?;
            push_item(model, &field.name, item);
            return Ok(true);
        }
        Ok(false)
    }

    fn read_map_field<R: BufRead>(
        &self,
        context: &mut XmlUnmarshallerContext<R>,
        model: &mut Model,
        field: &FieldDescriptor,
        value_type: &FieldType,
        target_depth: usize,
    ) -> Result<bool> {
        let entry_path = if field.xml.flattened {
            field.xml_name.clone()
        } else {
            if context.test_expression(&field.xml_name, target_depth) {
                if !model.is_set(&field.name) {
                    model.set(&field.name, Value::Map(BTreeMap::new()));
                }
                return Ok(true);
            }
            format!("{}/{}", field.xml_name, field.xml.entry_name)
        };

        if !context.test_expression(&entry_path, target_depth) {
            return Ok(false);
        }
        if let Some((key, value)) = read_entry(self.service, context, &field.name, value_type, &field.xml)? {
            match model.get_mut(&field.name) {
                Some(Value::Map(entries)) => {
                    entries.insert(key, value);
                },
                _ => {
                    model.set(&field.name, Value::Map(BTreeMap::from([(key, value)])));
                },
            }
        }
        Ok(true)
    }
}

fn push_item(model: &mut Model, name: &str, item: Value) {
    match model.get_mut(name) {
        Some(Value::List(items)) => items.push(item),
        _ => {
            model.set(name, Value::List(vec![item]));
        },
    }
}

/// Read the value of the element the cursor has just entered
fn read_value<R: BufRead>(
    service: &ServiceModel,
    context: &mut XmlUnmarshallerContext<R>,
    field: &str,
    field_type: &FieldType,
) -> Result<Value> {
    match field_type {
        FieldType::Structure(name) => {
            let nested = StructureUnmarshaller::for_shape(service, name)?;
            Ok(Value::Structure(nested.unmarshall(context)?))
        },
        FieldType::List(member) => {
            let binding = XmlBinding::default();
            let mut items = Vec::new();
            for_each_child(context, |context, target_depth| {
                if context.test_expression(&binding.member_name, target_depth) {
                    items.push(read_value(service, context, field, member)?);
                }
                Ok(())
            })?;
            Ok(Value::List(items))
        },
        FieldType::Map(_, value_type) => {
            let binding = XmlBinding::default();
            let mut entries = BTreeMap::new();
            for_each_child(context, |context, target_depth| {
                if context.test_expression(&binding.entry_name, target_depth) {
                    if let Some((key, value)) = read_entry(service, context, field, value_type, &binding)? {
                        entries.insert(key, value);
                    }
                }
                Ok(())
            })?;
            Ok(Value::Map(entries))
        },
        scalar => {
            let text = context.read_text()?;
            parse_scalar(field, scalar, &text)
        },
    }
}

/// Read one map entry element; entries without a key or value are dropped
fn read_entry<R: BufRead>(
    service: &ServiceModel,
    context: &mut XmlUnmarshallerContext<R>,
    field: &str,
    value_type: &FieldType,
    binding: &XmlBinding,
) -> Result<Option<(String, Value)>> {
    let mut key = None;
    let mut value = None;
    for_each_child(context, |context, target_depth| {
        if context.test_expression(&binding.key_name, target_depth) {
            key = Some(context.read_text()?);
        } else if context.test_expression(&binding.value_name, target_depth) {
            value = Some(read_value(service, context, field, value_type)?);
        }
        Ok(())
    })?;

    match (key, value) {
        (Some(key), Some(value)) => Ok(Some((key, value))),
        _ => {
            trace!(field = %field, "Dropping incomplete map entry");
            Ok(None)
        },
    }
}

/// Run `visit` for every start element and attribute until the current element closes
fn for_each_child<R, F>(context: &mut XmlUnmarshallerContext<R>, mut visit: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(&mut XmlUnmarshallerContext<R>, usize) -> Result<()>,
{
    let original_depth = context.current_depth();
    let target_depth = original_depth + 1;
    loop {
        match context.next_event()? {
            XmlEvent::EndDocument => return Ok(()),
            XmlEvent::StartElement { .. } | XmlEvent::Attribute { .. } => visit(context, target_depth)?,
            XmlEvent::EndElement { .. } if context.current_depth() < original_depth => return Ok(()),
            _ => {},
        }
    }
}

fn parse_scalar(field: &str, field_type: &FieldType, text: &str) -> Result<Value> {
    let value = match field_type {
        FieldType::String | FieldType::Enum(_) => Value::String(text.to_string()),
        FieldType::Integer => Value::Integer(text.trim().parse()?),
        FieldType::Long => Value::Long(text.trim().parse()?),
        FieldType::Boolean => Value::Boolean(text.trim().eq_ignore_ascii_case("true")),
        FieldType::Double => Value::Double(text.trim().parse()?),
        FieldType::Timestamp => Value::Timestamp(timestamp::parse_iso8601(text)?),
        other => {
            return Err(CodecError::TypeMismatch {
                field: field.to_string(),
                expected: "scalar".to_string(),
                found: other.to_string(),
            })
        },
    };
    Ok(value)
}
