//! SIP message and SDP model for the sipneg stack
//!
//! This crate holds the parsed objects the dialog layer works with: SIP
//! requests and responses with typed headers, and owned SDP session
//! descriptions with a parser, serializer and validator.

pub mod error;
pub mod types;

#[cfg(feature = "sdp")]
pub mod sdp;
#[cfg(feature = "sdp")]
pub mod sdp_prelude;

pub use error::{Error, Result};
pub use types::{
    Address, CSeq, CallId, HeaderAccess, Method, Request, Response, Scheme, StatusCode,
    TypedHeader, Uri,
};

/// Re-export of common types for easier use
pub mod prelude {
    pub use crate::types::*;
    pub use crate::{Error, Result};

    #[cfg(feature = "sdp")]
    pub use crate::sdp_prelude::*;
}
