//! Media line parsing and transport helpers

pub mod description;
pub mod transport;

pub use description::parse_media_description_line;
pub use transport::{transport_compare, trim_rtcp_fb, TransportProto};
