//! SIP header types

pub mod header_access;
pub mod typed_header;

pub use header_access::HeaderAccess;
pub use typed_header::{CSeq, CallId, TypedHeader};
