//! SIP dialogs (RFC 3261 Section 12)
//!
//! - [`DialogId`]: Call-ID plus local and remote tags
//! - [`Dialog`]: the dialog itself, shared as `Arc<Dialog>`
//! - [`DialogState`], [`DialogRole`], [`DialogCounters`]
//!
//! Dialogs are created against a [`UserAgent`](crate::manager::UserAgent),
//! which routes incoming messages and transaction events to them.

pub mod dialog_id;
pub mod dialog_impl;
pub mod dialog_state;

pub use dialog_id::DialogId;
pub use dialog_impl::{Dialog, DialogParty};
pub use dialog_state::{DialogCounters, DialogRole, DialogState};
