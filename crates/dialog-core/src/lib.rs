//! SIP dialog layer and SDP offer/answer negotiation
//!
//! ```text
//! session-core (INVITE sessions)
//!      ↓ Usage callbacks, SdpNegotiator
//! dialog-core  ← THIS CRATE
//!      ↓ TransactionLayer
//! transaction / transport layers
//! ```
//!
//! - [`sdp`]: RFC 3264 offer/answer state machine and codec matching
//! - [`dialog`]: RFC 3261 dialogs with usage dispatch
//! - [`manager`]: the [`UserAgent`] registry that routes messages to dialogs
//! - [`transaction`]: the seam to the transaction layer

pub mod config;
pub mod dialog;
pub mod errors;
pub mod events;
pub mod manager;
pub mod sdp;
pub mod transaction;
pub mod usage;

pub use config::{DialogConfig, NegotiatorConfig};
pub use dialog::{Dialog, DialogCounters, DialogId, DialogParty, DialogRole, DialogState};
pub use errors::{
    DialogError, DialogResult, NegotiationError, NegotiationErrorKind, NegotiationResult,
};
pub use events::DialogEvent;
pub use manager::UserAgent;
pub use sdp::{FormatMatcher, FormatMatcherRegistry, MatchOptions, NegotiatorState, SdpNegotiator};
pub use transaction::{
    ClientAuth, TransactionKey, TransactionLayer, TransactionRole, TransactionState,
};
pub use usage::Usage;

/// Re-export of common types for easier use
pub mod prelude {
    pub use crate::{
        ClientAuth, Dialog, DialogConfig, DialogError, DialogEvent, DialogId, DialogResult,
        DialogRole, DialogState, NegotiationError, NegotiationErrorKind, NegotiationResult,
        NegotiatorConfig, NegotiatorState, SdpNegotiator, TransactionKey, TransactionLayer,
        TransactionRole, TransactionState, Usage, UserAgent,
    };
}
