//! Marshalled request handed to the transport layer

use shapewire_common::{Model, WireError};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "PATCH" => Ok(HttpMethod::Patch),
            other => Err(WireError::InvalidArgument(format!(
                "Unsupported HTTP method: {}",
                other
            ))),
        }
    }
}

/// A request ready for transmission
///
/// The body buffer is owned by the request; closing whatever stream it is
/// written to is the transport's business.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Service the request is addressed to (e.g., "DataPipeline")
    pub service_name: String,
    pub operation: String,
    pub http_method: HttpMethod,
    pub resource_path: String,
    pub headers: BTreeMap<String, String>,
    pub content: Vec<u8>,
    /// The model this request was marshalled from
    pub original: Model,
}

impl Request {
    pub fn new(service_name: impl Into<String>, operation: impl Into<String>, original: Model) -> Self {
        Self {
            service_name: service_name.into(),
            operation: operation.into(),
            http_method: HttpMethod::Post,
            resource_path: "/".to_string(),
            headers: BTreeMap::new(),
            content: Vec::new(),
            original,
        }
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Attach `content` and set the matching `Content-Length`
    pub fn set_content(&mut self, content: Vec<u8>) {
        self.add_header("Content-Length", content.len().to_string());
        self.content = content;
    }

    /// Body as UTF-8 text, lossily
    pub fn content_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trip() {
        for method in [HttpMethod::Get, HttpMethod::Post, HttpMethod::Delete] {
            assert_eq!(method.as_str().parse::<HttpMethod>().unwrap(), method);
        }
        assert_eq!("put".parse::<HttpMethod>().unwrap(), HttpMethod::Put);
        assert!("TRACE".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_set_content_updates_length() {
        let mut request = Request::new("DataPipeline", "QueryObjects", Model::new("QueryObjectsInput"));
        request.set_content(b"{}".to_vec());
        assert_eq!(request.header("Content-Length"), Some("2"));
        assert_eq!(request.content_str(), "{}");
        assert_eq!(request.http_method, HttpMethod::Post);
        assert_eq!(request.resource_path, "/");
    }
}
