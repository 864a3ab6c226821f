//! # SIP and SDP message types
//!
//! Parsed representations handed between the transport, dialog and session
//! layers.

pub mod address;
pub mod headers;
pub mod method;
#[cfg(feature = "sdp")]
pub mod sdp;
pub mod sip_request;
pub mod sip_response;
pub mod status;
pub mod uri;

pub use address::Address;
pub use headers::{CSeq, CallId, HeaderAccess, TypedHeader};
pub use method::Method;
pub use sip_request::Request;
pub use sip_response::Response;
pub use status::StatusCode;
pub use uri::{Scheme, Uri};
