use super::generator::{JsonProtocolFactory, StructuredJsonGenerator};
use crate::{input_shape, structure, CodecError, HttpMethod, Request, Result};
use shapewire_common::{Model, ServiceModel, StructureShape, Value, WireError};
use tracing::debug;

/// Marshalls request models of one awsJson service
///
/// Fields are written in declaration order and only when present. Values
/// are written as they are; nothing is validated against the field type.
#[derive(Debug, Clone)]
pub struct JsonRequestMarshaller<'a> {
    service: &'a ServiceModel,
    factory: JsonProtocolFactory,
}

impl<'a> JsonRequestMarshaller<'a> {
    pub fn new(service: &'a ServiceModel) -> Self {
        Self {
            service,
            factory: JsonProtocolFactory::for_service(service),
        }
    }

    /// Build the request for `operation` from `input`
    pub fn marshall(&self, operation: &str, input: Option<&Model>) -> Result<Request> {
        let input =
            input.ok_or_else(|| WireError::client("Invalid argument passed to marshall(...)"))?;
        let (op, shape) = input_shape(self.service, operation)?;

        let mut request = Request::new(&self.service.service_name, &op.name, input.clone());
        request.add_header(
            "X-Amz-Target",
            format!("{}.{}", self.service.target_prefix, op.name),
        );
        request.http_method = HttpMethod::Post;
        request.resource_path = "/".to_string();

        let mut generator = self.factory.create_generator();
        self.marshall_into(&mut generator, shape, input)?;

        request.add_header("Content-Type", self.factory.content_type());
        request.set_content(generator.into_bytes());

        debug!(
            operation = %op.name,
            bytes = request.content.len(),
            "Marshalled JSON request"
        );
        Ok(request)
    }

    /// Write `input` as one JSON object into `generator`
    ///
    /// Without a shape the body is an empty object. Any failure, including one
    /// raised by the generator, is reported as a client error carrying the cause.
    pub fn marshall_into<G>(
        &self,
        generator: &mut G,
        shape: Option<&StructureShape>,
        input: &Model,
    ) -> Result<()>
    where
        G: StructuredJsonGenerator + ?Sized,
    {
        let written = match shape {
            Some(shape) => self.write_structure(generator, shape, input),
            None => generator
                .write_start_object()
                .and_then(|_| generator.write_end_object())
                .map_err(CodecError::from),
        };

        written.map_err(|e| {
            CodecError::Wire(WireError::client_with_source(
                format!("Unable to marshall request to JSON: {}", e),
                e,
            ))
        })
    }

    fn write_structure<G>(&self, generator: &mut G, shape: &StructureShape, model: &Model) -> Result<()>
    where
        G: StructuredJsonGenerator + ?Sized,
    {
        generator.write_start_object()?;
        for field in &shape.fields {
            if let Some(value) = model.get(&field.name) {
                generator.write_field_name(&field.json_name)?;
                self.write_value(generator, value)?;
            }
        }
        generator.write_end_object()?;
        Ok(())
    }

    fn write_value<G>(&self, generator: &mut G, value: &Value) -> Result<()>
    where
        G: StructuredJsonGenerator + ?Sized,
    {
        match value {
            Value::String(v) => generator.write_string(v)?,
            Value::Integer(v) => generator.write_i64(i64::from(*v))?,
            Value::Long(v) => generator.write_i64(*v)?,
            Value::Boolean(v) => generator.write_bool(*v)?,
            Value::Double(v) => generator.write_f64(*v)?,
            Value::Timestamp(v) => generator.write_timestamp(v)?,
            Value::Structure(nested) => {
                let shape = structure(self.service, nested.shape())?;
                self.write_structure(generator, shape, nested)?;
            },
            Value::List(items) => {
                generator.write_start_array()?;
                for item in items {
                    self.write_value(generator, item)?;
                }
                generator.write_end_array()?;
            },
            Value::Map(entries) => {
                generator.write_start_object()?;
                for (key, item) in entries {
                    generator.write_field_name(key)?;
                    self.write_value(generator, item)?;
                }
                generator.write_end_object()?;
            },
        }
        Ok(())
    }
}
