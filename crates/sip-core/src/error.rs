//! Error types for sip-core
//!
//! Every fallible parser and validator in this crate returns [`Result`],
//! carrying an [`Error`] that names what was wrong with the input.

use thiserror::Error;

/// Result alias used throughout sip-core
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building, parsing or validating SIP and SDP data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A URI could not be parsed
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// A method token was empty or contained illegal characters
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// A header value was malformed
    #[error("Invalid header {name}: {message}")]
    InvalidHeader { name: String, message: String },

    /// A required header was absent from a message
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    /// A status code was outside 100..=699
    #[error("Invalid status code: {0}")]
    InvalidStatusCode(u16),

    /// SDP text could not be parsed
    #[error("SDP parsing error: {0}")]
    SdpParsingError(String),

    /// SDP parsed but is structurally invalid
    #[error("SDP validation error: {0}")]
    SdpValidation(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidHeader`]
    pub fn invalid_header(name: &str, message: impl Into<String>) -> Self {
        Error::InvalidHeader {
            name: name.to_string(),
            message: message.into(),
        }
    }
}
