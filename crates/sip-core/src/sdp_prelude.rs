//! # SDP Prelude
//!
//! Re-exports the SDP model and helpers, typically imported with
//! `use sipneg_sip_core::sdp_prelude::*;`

pub use crate::sdp::attributes::{FmtpAttribute, MediaDirection, RtpMapAttribute};
pub use crate::sdp::media::{transport_compare, trim_rtcp_fb, TransportProto};
pub use crate::sdp::parser::parse_sdp;
pub use crate::sdp::session::validate_sdp;
pub use crate::types::sdp::{
    Bandwidth, ConnectionData, MediaDescription, Origin, SdpAttribute, SdpSession,
    TimeDescription, CONTENT_TYPE_SDP,
};
