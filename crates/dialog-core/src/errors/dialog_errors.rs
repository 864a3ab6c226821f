//! Dialog layer errors

use sipneg_sip_core::StatusCode;

/// Result type for dialog operations
pub type DialogResult<T> = Result<T, DialogError>;

/// Errors raised by the dialog layer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DialogError {
    /// The request cannot create a dialog (has a To tag or wrong method)
    #[error("Request cannot create a dialog: {message}")]
    InvalidRequest { message: String },

    /// A dialog-creating message had no Contact header
    #[error("Missing Contact header")]
    MissingContact,

    /// A usage with the same name is already attached
    #[error("Usage already registered: {name}")]
    UsageExists { name: String },

    /// A message violated RFC 3261 in a way the dialog cannot absorb
    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    /// The transaction layer rejected an operation
    #[error("Transaction error: {message}")]
    TransactionError { message: String },

    /// The user agent that owned the dialog has shut down
    #[error("User agent is no longer available")]
    UserAgentGone,

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Malformed SIP data
    #[error("SIP error: {0}")]
    Sip(#[from] sipneg_sip_core::Error),
}

impl DialogError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        DialogError::InvalidRequest { message: message.into() }
    }

    pub fn protocol_error(message: impl Into<String>) -> Self {
        DialogError::ProtocolError { message: message.into() }
    }

    pub fn transaction_error(message: impl Into<String>) -> Self {
        DialogError::TransactionError { message: message.into() }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        DialogError::ConfigError { message: message.into() }
    }

    /// Status code a UAS should answer with when this error rejects a request
    pub fn status_code(&self) -> StatusCode {
        match self {
            DialogError::MissingContact
            | DialogError::InvalidRequest { .. }
            | DialogError::ProtocolError { .. }
            | DialogError::Sip(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::SERVER_INTERNAL_ERROR,
        }
    }
}
