//! INVITE session errors

use sipneg_dialog_core::{DialogError, NegotiationError};

use crate::invite::InviteState;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// The dialog layer failed to build or send a message
    #[error("Dialog error: {0}")]
    Dialog(#[from] DialogError),

    /// SDP offer/answer failed
    #[error("Negotiation error: {0}")]
    Negotiation(#[from] NegotiationError),

    /// Operation not allowed in the current session state
    #[error("Operation {operation} not allowed in {state}")]
    InvalidState {
        operation: &'static str,
        state: InviteState,
    },

    /// The request cannot be used for this operation
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl SessionError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        SessionError::InvalidRequest { message: message.into() }
    }
}
