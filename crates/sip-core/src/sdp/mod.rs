//! # SDP support
//!
//! Text parsing, validation and transport helpers for the session
//! description model in [`crate::types::sdp`].

pub mod attributes;
pub mod media;
pub mod parser;
pub mod session;

pub use attributes::{FmtpAttribute, MediaDirection, RtpMapAttribute};
pub use media::{transport_compare, trim_rtcp_fb, TransportProto};
pub use parser::parse_sdp;
pub use session::validate_sdp;
