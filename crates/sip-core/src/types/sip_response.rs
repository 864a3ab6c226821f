//! # SIP Response

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::headers::{HeaderAccess, TypedHeader};
use super::sip_request::{Request, SIP_VERSION};
use super::status::StatusCode;

/// A SIP response message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: StatusCode,
    pub reason: String,
    pub version: String,
    pub headers: Vec<TypedHeader>,
    pub body: Bytes,
}

impl Response {
    /// Creates a response with the standard reason phrase and no headers
    pub fn new(status: StatusCode) -> Self {
        Response {
            status,
            reason: status.reason_phrase().to_string(),
            version: SIP_VERSION.to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a response to `request`, copying Via, From, To, Call-ID and
    /// CSeq as RFC 3261 Section 8.2.6.2 requires
    pub fn from_request(request: &Request, status: StatusCode) -> Self {
        let mut response = Response::new(status);
        response.headers = request
            .headers
            .iter()
            .filter(|h| {
                matches!(
                    h,
                    TypedHeader::Via(_)
                        | TypedHeader::From(_)
                        | TypedHeader::To(_)
                        | TypedHeader::CallId(_)
                        | TypedHeader::CSeq(_)
                )
            })
            .cloned()
            .collect();
        response
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_header(mut self, header: TypedHeader) -> Self {
        self.headers.push(header);
        self
    }

    /// Sets the body together with its Content-Type
    pub fn with_body(mut self, content_type: &str, body: impl Into<Bytes>) -> Self {
        self.set_body(content_type, body);
        self
    }

    pub fn set_body(&mut self, content_type: &str, body: impl Into<Bytes>) {
        self.body = body.into();
        self.set_header(TypedHeader::ContentType(content_type.to_string()));
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Short description used in log lines, e.g. `200/INVITE/cseq=3`
    pub fn info(&self) -> String {
        match self.cseq() {
            Some(cseq) => format!("{}/{}/cseq={}", self.status, cseq.method, cseq.seq),
            None => self.status.to_string(),
        }
    }
}

impl HeaderAccess for Response {
    fn headers(&self) -> &[TypedHeader] {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Vec<TypedHeader> {
        &mut self.headers
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}\r\n", self.version, self.status, self.reason)?;
        for header in &self.headers {
            write!(f, "{}\r\n", header)?;
        }
        write!(f, "Content-Length: {}\r\n\r\n", self.body.len())?;
        f.write_str(&String::from_utf8_lossy(&self.body))
    }
}
