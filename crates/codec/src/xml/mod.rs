//! restXml protocol support
//!
//! Responses are read through an [`XmlUnmarshallerContext`], a depth-tracking
//! cursor over `quick-xml` pull events. A [`StructureUnmarshaller`] captures
//! the cursor depth when it starts and consumes events until its element
//! closes:
//!
//! ```text
//! <GetTrafficPolicyResponse>        depth 1  (response wrapper)
//!   <TrafficPolicy>                 depth 2  field of the result shape
//!     <Id>tp-1</Id>                 depth 3  field of TrafficPolicy
//!   </TrafficPolicy>
//! </GetTrafficPolicyResponse>
//! ```

mod context;
mod marshaller;
mod unmarshaller;

pub use context::{XmlEvent, XmlUnmarshallerContext};
pub use marshaller::XmlRequestMarshaller;
pub use unmarshaller::{unmarshall_xml, StructureUnmarshaller};
