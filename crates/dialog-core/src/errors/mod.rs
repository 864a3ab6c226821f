//! Error types for dialog-core
//!
//! This module defines the error types used throughout the dialog-core crate:
//! dialog-layer errors and SDP negotiation errors.

pub mod dialog_errors;
pub mod negotiation_errors;

// Re-export main error types
pub use dialog_errors::{DialogError, DialogResult};
pub use negotiation_errors::{NegotiationError, NegotiationErrorKind, NegotiationResult};
