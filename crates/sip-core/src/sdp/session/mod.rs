//! Session-level line parsing and validation

pub mod connection;
pub mod origin;
pub mod validation;

pub use connection::parse_connection_line;
pub use origin::parse_origin_line;
pub use validation::validate_sdp;
