//! INVITE sessions on top of SIP dialogs
//!
//! An [`InviteSession`] attaches to a [`Dialog`](sipneg_dialog_core::Dialog)
//! as a usage, carries SDP offers and answers in INVITE, ACK and their
//! responses, and feeds every negotiated SDP pair to a [`MediaChannel`].
//!
//! ```text
//! application
//!      ↓ invite / answer / reinvite / bye
//! session-core  ← THIS CRATE
//!      ↓ Usage callbacks, SdpNegotiator
//! dialog-core
//! ```

pub mod config;
pub mod errors;
pub mod invite;
pub mod media;

pub use config::SessionConfig;
pub use errors::{SessionError, SessionResult};
pub use invite::{InviteSession, InviteState, INVITE_USAGE_NAME, INVITE_USAGE_PRIORITY};
pub use media::MediaChannel;

/// Re-export of common types for easier use
pub mod prelude {
    pub use crate::{
        InviteSession, InviteState, MediaChannel, SessionConfig, SessionError, SessionResult,
    };
}
