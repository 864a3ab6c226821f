//! SDP negotiation errors
//!
//! Every negotiator operation that can fail returns a [`NegotiationError`].
//! Errors fall into three categories, see [`NegotiationErrorKind`].

use serde::{Deserialize, Serialize};

use crate::sdp::NegotiatorState;

/// Result type for negotiator operations
pub type NegotiationResult<T> = Result<T, NegotiationError>;

/// Broad category of a negotiation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NegotiationErrorKind {
    /// Input SDP failed validation
    StructuralValidation,
    /// Operation called in the wrong negotiator state
    StateViolation,
    /// Offer and answer could not be reconciled
    NegotiationFailure,
}

/// Errors returned by the SDP negotiator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    #[error("Invalid SDP: {0}")]
    InvalidSdp(String),

    #[error("Operation {operation} not allowed in {state}")]
    StateViolation {
        operation: &'static str,
        state: NegotiatorState,
    },

    #[error("No active local SDP")]
    NoActiveSession,

    #[error("No initial SDP to answer with")]
    NoInitialSdp,

    #[error("No common media format")]
    NoCommonMedia,

    #[error("No codec in the local capability matches the offer")]
    NoAnswerCodec,

    #[error("No non-RTP format in the local capability matches the offer")]
    NoAnswerUnknownFormat,

    #[error("Answer media type does not match the offer")]
    InvalidAnswerMediaType,

    #[error("Answer transport does not match the offer")]
    InvalidAnswerTransport,

    #[error("No active media stream after negotiation")]
    NoActiveMedia,
}

impl NegotiationError {
    /// Category of this error
    pub fn kind(&self) -> NegotiationErrorKind {
        match self {
            NegotiationError::InvalidSdp(_) => NegotiationErrorKind::StructuralValidation,
            NegotiationError::StateViolation { .. }
            | NegotiationError::NoActiveSession
            | NegotiationError::NoInitialSdp => NegotiationErrorKind::StateViolation,
            NegotiationError::NoCommonMedia
            | NegotiationError::NoAnswerCodec
            | NegotiationError::NoAnswerUnknownFormat
            | NegotiationError::InvalidAnswerMediaType
            | NegotiationError::InvalidAnswerTransport
            | NegotiationError::NoActiveMedia => NegotiationErrorKind::NegotiationFailure,
        }
    }

    pub(crate) fn state_violation(operation: &'static str, state: NegotiatorState) -> Self {
        NegotiationError::StateViolation { operation, state }
    }
}

impl From<sipneg_sip_core::Error> for NegotiationError {
    fn from(err: sipneg_sip_core::Error) -> Self {
        NegotiationError::InvalidSdp(err.to_string())
    }
}
