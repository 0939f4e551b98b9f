use crate::{CodecError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::VecDeque;
use std::fmt;
use std::io::BufRead;

/// Pull-parser event as seen by the unmarshallers
///
/// Attributes of a start element are delivered as separate events right
/// after it. Namespace declarations are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    StartElement {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Attribute {
        name: String,
        value: String,
    },
    Characters(String),
    EndElement {
        name: String,
    },
    EndDocument,
}

impl fmt::Display for XmlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlEvent::StartElement { name, .. } => write!(f, "<{}>", name),
            XmlEvent::Attribute { name, value } => write!(f, "{}=\"{}\"", name, value),
            XmlEvent::Characters(text) => write!(f, "{:?}", text),
            XmlEvent::EndElement { name } => write!(f, "</{}>", name),
            XmlEvent::EndDocument => write!(f, "end of document"),
        }
    }
}

/// Cursor over an XML document
///
/// Tracks the stack of open element names so unmarshallers can ask for the
/// current depth and test path expressions against it.
pub struct XmlUnmarshallerContext<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Event peeked from the reader but not yet consumed
    lookahead: Option<XmlEvent>,
    /// Attribute events of the last start element still to be delivered
    attributes: VecDeque<XmlEvent>,
    stack: Vec<String>,
    current: Option<XmlEvent>,
}

impl<'b> XmlUnmarshallerContext<&'b [u8]> {
    pub fn from_bytes(bytes: &'b [u8]) -> Self {
        Self::new(bytes)
    }
}

impl<R: BufRead> XmlUnmarshallerContext<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
            lookahead: None,
            attributes: VecDeque::new(),
            stack: Vec::new(),
            current: None,
        }
    }

    /// Number of currently open elements
    pub fn current_depth(&self) -> usize {
        self.stack.len()
    }

    /// True until the first event has been consumed
    pub fn is_start_of_document(&self) -> bool {
        self.current.is_none()
    }

    /// Most recently consumed event
    pub fn current_event(&self) -> Option<&XmlEvent> {
        self.current.as_ref()
    }

    /// Consume the next event and update the element stack
    pub fn next_event(&mut self) -> Result<XmlEvent> {
        let event = match self.attributes.pop_front() {
            Some(attribute) => attribute,
            None => self.next_raw()?,
        };

        match &event {
            XmlEvent::StartElement { name, attributes } => {
                self.stack.push(name.clone());
                self.attributes = attributes
                    .iter()
                    .map(|(name, value)| XmlEvent::Attribute {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect();
            },
            XmlEvent::EndElement { .. } => {
                self.stack.pop();
            },
            _ => {},
        }

        self.current = Some(event.clone());
        Ok(event)
    }

    /// Next event, without consuming it
    pub fn peek_event(&mut self) -> Result<XmlEvent> {
        if let Some(attribute) = self.attributes.front() {
            return Ok(attribute.clone());
        }
        let event = self.next_raw()?;
        self.lookahead = Some(event.clone());
        Ok(event)
    }

    /// Text content of the current element, or the value of the current attribute
    ///
    /// Character events are consumed up to (not including) the closing tag.
    /// Anything else before it is an error. Attributes of the element that
    /// have not been visited yet are discarded.
    pub fn read_text(&mut self) -> Result<String> {
        if let Some(XmlEvent::Attribute { value, .. }) = &self.current {
            return Ok(value.clone());
        }

        self.attributes.clear();
        let mut text = String::new();
        loop {
            match self.next_raw()? {
                XmlEvent::Characters(chunk) => text.push_str(&chunk),
                end @ XmlEvent::EndElement { .. } => {
                    self.lookahead = Some(end);
                    return Ok(text);
                },
                other => return Err(CodecError::UnexpectedEvent(other.to_string())),
            }
        }
    }

    /// Test a path expression against the current position
    ///
    /// `"."` always matches. Otherwise the expression's `/`-separated steps
    /// must be the innermost open elements (an `@name` step matches the
    /// current attribute), and the depth must equal `target_depth` plus one
    /// for every element step after the first.
    pub fn test_expression(&self, expression: &str, target_depth: usize) -> bool {
        if expression == "." {
            return true;
        }

        let steps: Vec<&str> = expression.split('/').collect();
        let nested = steps[1..].iter().filter(|s| !s.starts_with('@')).count();
        if self.current_depth() != target_depth + nested {
            return false;
        }

        let attribute = match &self.current {
            Some(XmlEvent::Attribute { name, .. }) => Some(format!("@{}", name)),
            _ => None,
        };
        let path: Vec<&str> = self
            .stack
            .iter()
            .map(String::as_str)
            .chain(attribute.as_deref())
            .collect();

        path.ends_with(&steps)
    }

    fn next_raw(&mut self) -> Result<XmlEvent> {
        if let Some(event) = self.lookahead.take() {
            return Ok(event);
        }

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(start) => {
                    let mut attributes = Vec::new();
                    for attribute in start.attributes() {
                        let attribute = attribute.map_err(quick_xml::Error::from)?;
                        let key = attribute.key.as_ref();
                        if key == b"xmlns" || key.starts_with(b"xmlns:") {
                            continue;
                        }
                        attributes.push((
                            decode(attribute.key.local_name().as_ref()),
                            attribute.unescape_value()?.into_owned(),
                        ));
                    }
                    XmlEvent::StartElement {
                        name: decode(start.local_name().as_ref()),
                        attributes,
                    }
                },
                Event::End(end) => XmlEvent::EndElement {
                    name: decode(end.local_name().as_ref()),
                },
                Event::Text(text) => XmlEvent::Characters(text.unescape()?.into_owned()),
                Event::CData(data) => XmlEvent::Characters(decode(&data)),
                Event::Eof => XmlEvent::EndDocument,
                // declarations, comments, processing instructions
                _ => continue,
            };
            return Ok(event);
        }
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str) -> XmlEvent {
        XmlEvent::StartElement {
            name: name.to_string(),
            attributes: Vec::new(),
        }
    }

    #[test]
    fn test_depth_tracking() {
        let mut ctx = XmlUnmarshallerContext::from_bytes(b"<a><b>text</b><c/></a>");
        assert!(ctx.is_start_of_document());
        assert_eq!(ctx.current_depth(), 0);

        assert_eq!(ctx.next_event().unwrap(), start("a"));
        assert!(!ctx.is_start_of_document());
        assert_eq!(ctx.next_event().unwrap(), start("b"));
        assert_eq!(ctx.current_depth(), 2);
        assert_eq!(ctx.next_event().unwrap(), XmlEvent::Characters("text".to_string()));
        assert_eq!(
            ctx.next_event().unwrap(),
            XmlEvent::EndElement { name: "b".to_string() }
        );
        assert_eq!(ctx.current_depth(), 1);

        // empty elements are expanded
        assert_eq!(ctx.next_event().unwrap(), start("c"));
        assert_eq!(
            ctx.next_event().unwrap(),
            XmlEvent::EndElement { name: "c".to_string() }
        );
        ctx.next_event().unwrap();
        assert_eq!(ctx.current_depth(), 0);
        assert_eq!(ctx.next_event().unwrap(), XmlEvent::EndDocument);
    }

    #[test]
    fn test_attributes_follow_start_element() {
        let xml = br#"<r xmlns="urn:x" xmlns:p="urn:p"><item p:kind="a" id="1"/></r>"#;
        let mut ctx = XmlUnmarshallerContext::from_bytes(xml);

        assert_eq!(ctx.next_event().unwrap(), start("r"));
        match ctx.next_event().unwrap() {
            XmlEvent::StartElement { name, attributes } => {
                assert_eq!(name, "item");
                assert_eq!(attributes.len(), 2);
            },
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            ctx.peek_event().unwrap(),
            XmlEvent::Attribute {
                name: "kind".to_string(),
                value: "a".to_string()
            }
        );
        ctx.next_event().unwrap();
        assert!(ctx.test_expression("item/@kind", 2));
        assert_eq!(ctx.read_text().unwrap(), "a");

        ctx.next_event().unwrap();
        assert!(ctx.test_expression("@id", 2));
        assert!(!ctx.test_expression("@kind", 2));
        assert_eq!(ctx.current_depth(), 2);
    }

    #[test]
    fn test_read_text_stops_before_end_element() {
        let xml = b"<a><b>x &amp; <![CDATA[<y>]]></b></a>";
        let mut ctx = XmlUnmarshallerContext::from_bytes(xml);
        ctx.next_event().unwrap();
        ctx.next_event().unwrap();

        assert_eq!(ctx.read_text().unwrap(), "x & <y>");
        assert_eq!(ctx.current_depth(), 2);
        assert_eq!(
            ctx.peek_event().unwrap(),
            XmlEvent::EndElement { name: "b".to_string() }
        );
        ctx.next_event().unwrap();
        assert_eq!(ctx.current_depth(), 1);
    }

    #[test]
    fn test_read_text_discards_pending_attributes() {
        let mut ctx = XmlUnmarshallerContext::from_bytes(br#"<a><Id kind="x">v</Id></a>"#);
        ctx.next_event().unwrap();
        ctx.next_event().unwrap();

        assert_eq!(ctx.read_text().unwrap(), "v");
        assert_eq!(
            ctx.next_event().unwrap(),
            XmlEvent::EndElement { name: "Id".to_string() }
        );
        assert_eq!(ctx.current_depth(), 1);
    }

    #[test]
    fn test_read_text_rejects_nested_elements() {
        let mut ctx = XmlUnmarshallerContext::from_bytes(b"<a><b><c/></b></a>");
        ctx.next_event().unwrap();
        ctx.next_event().unwrap();

        let err = ctx.read_text().unwrap_err();
        assert_eq!(err.to_string(), "Encountered unexpected event: <c>");
    }

    #[test]
    fn test_expression_depths() {
        let xml = b"<Response><Policies><member><Id>1</Id></member></Policies></Response>";
        let mut ctx = XmlUnmarshallerContext::from_bytes(xml);
        assert!(ctx.test_expression(".", 7));

        ctx.next_event().unwrap();
        ctx.next_event().unwrap();
        assert!(ctx.test_expression("Policies", 2));
        assert!(!ctx.test_expression("Policies", 1));
        assert!(!ctx.test_expression("Response", 2));

        ctx.next_event().unwrap();
        assert!(ctx.test_expression("Policies/member", 2));
        assert!(ctx.test_expression("member", 3));
        assert!(!ctx.test_expression("Policies/member", 3));
        assert!(!ctx.test_expression("Other/member", 2));

        ctx.next_event().unwrap();
        assert!(ctx.test_expression("Policies/member/Id", 2));
    }

    #[test]
    fn test_malformed_document_surfaces_parser_error() {
        let mut ctx = XmlUnmarshallerContext::from_bytes(b"<a></b>");
        ctx.next_event().unwrap();
        assert!(matches!(ctx.next_event(), Err(CodecError::Xml(_))));
    }
}
