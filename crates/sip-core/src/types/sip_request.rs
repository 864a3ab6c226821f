//! # SIP Request
//!
//! A parsed SIP request as delivered by the transport layer, or a request
//! built by the dialog layer before it is handed to a transaction.
//!
//! ```rust
//! use sipneg_sip_core::{CallId, HeaderAccess, Method, Request, TypedHeader};
//!
//! let request = Request::new(Method::Invite, "sip:bob@example.com".parse().unwrap())
//!     .with_header(TypedHeader::CallId(CallId::new("abc123")))
//!     .with_header(TypedHeader::MaxForwards(70));
//!
//! assert_eq!(request.call_id().unwrap().as_str(), "abc123");
//! assert!(request.body.is_empty());
//! ```

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::headers::{HeaderAccess, TypedHeader};
use super::method::Method;
use super::uri::Uri;

/// SIP protocol version carried on every start line
pub const SIP_VERSION: &str = "SIP/2.0";

/// A SIP request message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The method of the request
    pub method: Method,
    /// The request URI
    pub uri: Uri,
    /// The SIP version
    pub version: String,
    /// Headers in message order
    pub headers: Vec<TypedHeader>,
    /// The body of the request
    pub body: Bytes,
}

impl Request {
    /// Creates a new SIP/2.0 request with no headers and an empty body
    pub fn new(method: Method, uri: Uri) -> Self {
        Request {
            method,
            uri,
            version: SIP_VERSION.to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Adds a typed header to the request
    pub fn with_header(mut self, header: TypedHeader) -> Self {
        self.headers.push(header);
        self
    }

    /// Sets the body together with its Content-Type
    pub fn with_body(mut self, content_type: &str, body: impl Into<Bytes>) -> Self {
        self.set_body(content_type, body);
        self
    }

    /// Replaces the body and its Content-Type
    pub fn set_body(&mut self, content_type: &str, body: impl Into<Bytes>) {
        self.body = body.into();
        self.set_header(TypedHeader::ContentType(content_type.to_string()));
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Short description used in log lines, e.g. `INVITE/cseq=3`
    pub fn info(&self) -> String {
        match self.cseq() {
            Some(cseq) => format!("{}/cseq={}", self.method, cseq.seq),
            None => self.method.to_string(),
        }
    }
}

impl HeaderAccess for Request {
    fn headers(&self) -> &[TypedHeader] {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Vec<TypedHeader> {
        &mut self.headers
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}\r\n", self.method, self.uri, self.version)?;
        for header in &self.headers {
            write!(f, "{}\r\n", header)?;
        }
        write!(f, "Content-Length: {}\r\n\r\n", self.body.len())?;
        f.write_str(&String::from_utf8_lossy(&self.body))
    }
}
