//! Structured JSON writer

use crate::timestamp;
use chrono::{DateTime, Utc};
use shapewire_common::ServiceModel;
use std::io;

/// Writer interface the JSON marshaller drives
#[cfg_attr(test, mockall::automock)]
pub trait StructuredJsonGenerator {
    fn write_start_object(&mut self) -> io::Result<()>;
    fn write_end_object(&mut self) -> io::Result<()>;
    fn write_start_array(&mut self) -> io::Result<()>;
    fn write_end_array(&mut self) -> io::Result<()>;
    fn write_field_name(&mut self, name: &str) -> io::Result<()>;
    fn write_string(&mut self, value: &str) -> io::Result<()>;
    fn write_i64(&mut self, value: i64) -> io::Result<()>;
    fn write_f64(&mut self, value: f64) -> io::Result<()>;
    fn write_bool(&mut self, value: bool) -> io::Result<()>;
    fn write_timestamp(&mut self, value: &DateTime<Utc>) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Object,
    Array,
}

/// Compact JSON writer backed by a byte buffer
#[derive(Debug, Default)]
pub struct JsonGenerator {
    buf: Vec<u8>,
    /// Open scopes, each with "has at least one entry"
    scopes: Vec<(Scope, bool)>,
    /// A field name was written and its value is still due
    after_field_name: bool,
}

impl JsonGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished document bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn begin_value(&mut self) -> io::Result<()> {
        if self.after_field_name {
            self.after_field_name = false;
            return Ok(());
        }
        match self.scopes.last_mut() {
            Some((Scope::Object, _)) => Err(invalid("value written without a field name")),
            Some((Scope::Array, has_entries)) => {
                if *has_entries {
                    self.buf.push(b',');
                }
                *has_entries = true;
                Ok(())
            },
            None if self.buf.is_empty() => Ok(()),
            None => Err(invalid("document already has a root value")),
        }
    }

    fn end_scope(&mut self, expected: Scope, close: u8) -> io::Result<()> {
        if self.after_field_name {
            return Err(invalid("field name without a value"));
        }
        match self.scopes.pop() {
            Some((scope, _)) if scope == expected => {
                self.buf.push(close);
                Ok(())
            },
            _ => Err(invalid("unbalanced end of scope")),
        }
    }
}

fn invalid(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.to_string())
}

impl StructuredJsonGenerator for JsonGenerator {
    fn write_start_object(&mut self) -> io::Result<()> {
        self.begin_value()?;
        self.scopes.push((Scope::Object, false));
        self.buf.push(b'{');
        Ok(())
    }

    fn write_end_object(&mut self) -> io::Result<()> {
        self.end_scope(Scope::Object, b'}')
    }

    fn write_start_array(&mut self) -> io::Result<()> {
        self.begin_value()?;
        self.scopes.push((Scope::Array, false));
        self.buf.push(b'[');
        Ok(())
    }

    fn write_end_array(&mut self) -> io::Result<()> {
        self.end_scope(Scope::Array, b']')
    }

    fn write_field_name(&mut self, name: &str) -> io::Result<()> {
        if self.after_field_name {
            return Err(invalid("field name without a value"));
        }
        match self.scopes.last_mut() {
            Some((Scope::Object, has_entries)) => {
                if *has_entries {
                    self.buf.push(b',');
                }
                *has_entries = true;
            },
            _ => return Err(invalid("field name outside of an object")),
        }
        serde_json::to_writer(&mut self.buf, name)?;
        self.buf.push(b':');
        self.after_field_name = true;
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> io::Result<()> {
        self.begin_value()?;
        serde_json::to_writer(&mut self.buf, value)?;
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> io::Result<()> {
        self.begin_value()?;
        serde_json::to_writer(&mut self.buf, &value)?;
        Ok(())
    }

    fn write_f64(&mut self, value: f64) -> io::Result<()> {
        if !value.is_finite() {
            return Err(invalid("non-finite double"));
        }
        self.begin_value()?;
        serde_json::to_writer(&mut self.buf, &value)?;
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> io::Result<()> {
        self.begin_value()?;
        self.buf
            .extend_from_slice(if value { b"true" } else { b"false" });
        Ok(())
    }

    fn write_timestamp(&mut self, value: &DateTime<Utc>) -> io::Result<()> {
        self.begin_value()?;
        self.buf
            .extend_from_slice(timestamp::format_epoch_seconds(value).as_bytes());
        Ok(())
    }
}

/// Content type and generator factory for one JSON dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonProtocolFactory {
    json_version: String,
}

impl JsonProtocolFactory {
    pub fn new(json_version: impl Into<String>) -> Self {
        Self {
            json_version: json_version.into(),
        }
    }

    pub fn for_service(service: &ServiceModel) -> Self {
        Self::new(service.json_version())
    }

    pub fn content_type(&self) -> String {
        format!("application/x-amz-json-{}", self.json_version)
    }

    pub fn create_generator(&self) -> JsonGenerator {
        JsonGenerator::new()
    }
}
