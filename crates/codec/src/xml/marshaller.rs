use crate::{input_shape, structure, timestamp, CodecError, HttpMethod, Request, Result};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use shapewire_common::{
    FieldDescriptor, HttpBinding, Model, ServiceModel, StructureShape, Value, WireError,
    XmlBinding,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Marshalls request models of one restXml service
#[derive(Debug, Clone, Copy)]
pub struct XmlRequestMarshaller<'a> {
    service: &'a ServiceModel,
}

impl<'a> XmlRequestMarshaller<'a> {
    pub fn new(service: &'a ServiceModel) -> Self {
        Self { service }
    }

    /// Build the request for `operation` from `input`
    ///
    /// URI labels, query parameters and headers are filled from the fields
    /// bound to them; every other field goes into the XML body.
    pub fn marshall(&self, operation: &str, input: Option<&Model>) -> Result<Request> {
        let input =
            input.ok_or_else(|| WireError::client("Invalid argument passed to marshall(...)"))?;
        let (op, shape) = input_shape(self.service, operation)?;
        let default_binding = HttpBinding::default();
        let binding = op.http.as_ref().unwrap_or(&default_binding);

        let mut request = Request::new(&self.service.service_name, &op.name, input.clone());
        request.http_method = binding.method.parse::<HttpMethod>()?;
        bind_http(&mut request, &binding.uri, shape, input).map_err(client_error)?;

        if let Some(shape) = shape.filter(|s| s.fields.iter().any(FieldDescriptor::is_body)) {
            let body = self.marshall_body(shape, input).map_err(client_error)?;
            request.add_header("Content-Type", "application/xml");
            request.set_content(body);
        }

        debug!(
            operation = %op.name,
            method = %request.http_method,
            path = %request.resource_path,
            bytes = request.content.len(),
            "Marshalled XML request"
        );
        Ok(request)
    }

    /// Serialize `model` as an XML document rooted at the shape's element
    pub fn marshall_body(&self, shape: &StructureShape, model: &Model) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        self.write_structure(
            &mut writer,
            shape.root_element(),
            shape,
            model,
            self.service.xml_namespace.as_deref(),
        )?;
        Ok(writer.into_inner())
    }

    fn write_structure(
        &self,
        writer: &mut Writer<Vec<u8>>,
        element: &str,
        shape: &StructureShape,
        model: &Model,
        namespace: Option<&str>,
    ) -> Result<()> {
        let mut start = BytesStart::new(element);
        if let Some(namespace) = namespace {
            start.push_attribute(("xmlns", namespace));
        }

        let mut children = Vec::new();
        for field in shape.fields.iter().filter(|f| f.is_body()) {
            let Some(value) = model.get(&field.name) else {
                continue;
            };
            if field.xml.attribute {
                let text = scalar_text(&field.name, value)?;
                start.push_attribute((field.xml_name.as_str(), text.as_str()));
            } else {
                children.push((field, value));
            }
        }

        writer.write_event(Event::Start(start))?;
        for (field, value) in children {
            self.write_field(writer, field, value)?;
        }
        writer.write_event(Event::End(BytesEnd::new(element)))?;
        Ok(())
    }

    fn write_field(&self, writer: &mut Writer<Vec<u8>>, field: &FieldDescriptor, value: &Value) -> Result<()> {
        match value {
            Value::List(items) if field.xml.flattened => {
                for item in items {
                    self.write_element(writer, &field.xml_name, item)?;
                }
                Ok(())
            },
            Value::List(items) => {
                writer.write_event(Event::Start(BytesStart::new(field.xml_name.as_str())))?;
                for item in items {
                    self.write_element(writer, &field.xml.member_name, item)?;
                }
                writer.write_event(Event::End(BytesEnd::new(field.xml_name.as_str())))?;
                Ok(())
            },
            Value::Map(entries) if field.xml.flattened => {
                self.write_entries(writer, &field.xml_name, entries, &field.xml)
            },
            Value::Map(entries) => {
                writer.write_event(Event::Start(BytesStart::new(field.xml_name.as_str())))?;
                self.write_entries(writer, &field.xml.entry_name, entries, &field.xml)?;
                writer.write_event(Event::End(BytesEnd::new(field.xml_name.as_str())))?;
                Ok(())
            },
            other => self.write_element(writer, &field.xml_name, other),
        }
    }

    fn write_element(&self, writer: &mut Writer<Vec<u8>>, element: &str, value: &Value) -> Result<()> {
        match value {
            Value::Structure(nested) => {
                let shape = structure(self.service, nested.shape())?;
                self.write_structure(writer, element, shape, nested, None)
            },
            Value::List(items) => {
                let binding = XmlBinding::default();
                writer.write_event(Event::Start(BytesStart::new(element)))?;
                for item in items {
                    self.write_element(writer, &binding.member_name, item)?;
                }
                writer.write_event(Event::End(BytesEnd::new(element)))?;
                Ok(())
            },
            Value::Map(entries) => {
                let binding = XmlBinding::default();
                writer.write_event(Event::Start(BytesStart::new(element)))?;
                self.write_entries(writer, &binding.entry_name, entries, &binding)?;
                writer.write_event(Event::End(BytesEnd::new(element)))?;
                Ok(())
            },
            scalar => {
                let text = scalar_text(element, scalar)?;
                writer.write_event(Event::Start(BytesStart::new(element)))?;
                writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(&text))))?;
                writer.write_event(Event::End(BytesEnd::new(element)))?;
                Ok(())
            },
        }
    }

    fn write_entries(
        &self,
        writer: &mut Writer<Vec<u8>>,
        entry_name: &str,
        entries: &BTreeMap<String, Value>,
        binding: &XmlBinding,
    ) -> Result<()> {
        for (key, value) in entries {
            writer.write_event(Event::Start(BytesStart::new(entry_name)))?;
            self.write_element(writer, &binding.key_name, &Value::String(key.clone()))?;
            self.write_element(writer, &binding.value_name, value)?;
            writer.write_event(Event::End(BytesEnd::new(entry_name)))?;
        }
        Ok(())
    }
}

/// Text form of a scalar value
fn scalar_text(field: &str, value: &Value) -> Result<String> {
    let text = match value {
        Value::String(v) => v.clone(),
        Value::Integer(v) => v.to_string(),
        Value::Long(v) => v.to_string(),
        Value::Boolean(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Timestamp(v) => timestamp::format_iso8601(v),
        other => {
            return Err(CodecError::TypeMismatch {
                field: field.to_string(),
                expected: "scalar".to_string(),
                found: other.kind().to_string(),
            })
        },
    };
    Ok(text)
}

fn client_error(e: CodecError) -> CodecError {
    CodecError::Wire(WireError::client_with_source(
        format!("Unable to marshall request to XML: {}", e),
        e,
    ))
}

/// Fill the URI labels, query string and headers of `request` from `model`
fn bind_http(
    request: &mut Request,
    uri: &str,
    shape: Option<&StructureShape>,
    model: &Model,
) -> Result<()> {
    request.resource_path = resolve_uri(uri, model)?;

    let Some(shape) = shape else {
        return Ok(());
    };
    append_query(&mut request.resource_path, shape, model)?;
    for field in &shape.fields {
        let (Some(header), Some(value)) = (&field.http_header, model.get(&field.name)) else {
            continue;
        };
        request.add_header(header.as_str(), header_text(header, value)?);
    }
    Ok(())
}

/// Substitute `{Label}` and greedy `{Label+}` placeholders with URI-encoded field values
///
/// A label without a value becomes an empty segment.
fn resolve_uri(uri: &str, model: &Model) -> Result<String> {
    let mut resolved = String::with_capacity(uri.len());
    let mut rest = uri;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        resolved.push_str(&rest[..open]);

        let label = &rest[open + 1..close];
        let (name, greedy) = match label.strip_suffix('+') {
            Some(name) => (name, true),
            None => (label, false),
        };
        if let Some(value) = model.get(name) {
            let text = scalar_text(name, value)?;
            if greedy {
                let segments: Vec<_> = text.split('/').map(urlencoding::encode).collect();
                resolved.push_str(&segments.join("/"));
            } else {
                resolved.push_str(&urlencoding::encode(&text));
            }
        }
        rest = &rest[close + 1..];
    }

    resolved.push_str(rest);
    Ok(resolved)
}

/// Append `http_query` fields to `path`; list values repeat the parameter
fn append_query(path: &mut String, shape: &StructureShape, model: &Model) -> Result<()> {
    let mut params = Vec::new();
    for field in &shape.fields {
        let (Some(param), Some(value)) = (&field.http_query, model.get(&field.name)) else {
            continue;
        };
        let values = match value {
            Value::List(items) => items.iter().collect(),
            other => vec![other],
        };
        for value in values {
            let text = scalar_text(&field.name, value)?;
            params.push(format!(
                "{}={}",
                urlencoding::encode(param),
                urlencoding::encode(&text)
            ));
        }
    }

    if !params.is_empty() {
        path.push(if path.contains('?') { '&' } else { '?' });
        path.push_str(&params.join("&"));
    }
    Ok(())
}

/// Header form of a value; timestamps use the HTTP date format and lists are comma-joined
fn header_text(header: &str, value: &Value) -> Result<String> {
    match value {
        Value::Timestamp(v) => Ok(timestamp::format_http_date(v)),
        Value::List(items) => {
            let parts = items
                .iter()
                .map(|item| header_text(header, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(parts.join(", "))
        },
        other => scalar_text(header, other),
    }
}
