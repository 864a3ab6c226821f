//! Typed SIP headers
//!
//! The transport layer hands the dialog layer messages whose headers are
//! already split into [`TypedHeader`] values. Headers the dialog layer never
//! interprets are carried as [`TypedHeader::Other`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::address::Address;
use crate::types::method::Method;

/// CSeq header value: sequence number plus method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CSeq {
    pub seq: u32,
    pub method: Method,
}

impl CSeq {
    pub fn new(seq: u32, method: Method) -> Self {
        Self { seq, method }
    }
}

impl fmt::Display for CSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.seq, self.method)
    }
}

/// Call-ID header value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub String);

impl CallId {
    pub fn new(value: impl Into<String>) -> Self {
        CallId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed SIP header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypedHeader {
    Via(String),
    From(Address),
    To(Address),
    CallId(CallId),
    CSeq(CSeq),
    Contact(Address),
    Route(Address),
    RecordRoute(Address),
    MaxForwards(u8),
    ContentType(String),
    Authorization(String),
    UserAgent(String),
    Other { name: String, value: String },
}

impl TypedHeader {
    /// Canonical header name
    pub fn name(&self) -> &str {
        match self {
            TypedHeader::Via(_) => "Via",
            TypedHeader::From(_) => "From",
            TypedHeader::To(_) => "To",
            TypedHeader::CallId(_) => "Call-ID",
            TypedHeader::CSeq(_) => "CSeq",
            TypedHeader::Contact(_) => "Contact",
            TypedHeader::Route(_) => "Route",
            TypedHeader::RecordRoute(_) => "Record-Route",
            TypedHeader::MaxForwards(_) => "Max-Forwards",
            TypedHeader::ContentType(_) => "Content-Type",
            TypedHeader::Authorization(_) => "Authorization",
            TypedHeader::UserAgent(_) => "User-Agent",
            TypedHeader::Other { name, .. } => name,
        }
    }

    /// True when both headers are of the same kind (same header name)
    pub fn same_kind(&self, other: &TypedHeader) -> bool {
        self.name().eq_ignore_ascii_case(other.name())
    }
}

impl fmt::Display for TypedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.name())?;
        match self {
            TypedHeader::Via(v)
            | TypedHeader::ContentType(v)
            | TypedHeader::Authorization(v)
            | TypedHeader::UserAgent(v) => f.write_str(v),
            TypedHeader::From(a)
            | TypedHeader::To(a)
            | TypedHeader::Contact(a)
            | TypedHeader::Route(a)
            | TypedHeader::RecordRoute(a) => write!(f, "{}", a),
            TypedHeader::CallId(c) => write!(f, "{}", c),
            TypedHeader::CSeq(c) => write!(f, "{}", c),
            TypedHeader::MaxForwards(n) => write!(f, "{}", n),
            TypedHeader::Other { value, .. } => f.write_str(value),
        }
    }
}
