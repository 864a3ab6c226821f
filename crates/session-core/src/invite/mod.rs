//! INVITE sessions
//!
//! An [`InviteSession`] is the dialog usage that drives an SDP negotiator
//! from INVITE, re-INVITE, ACK and BYE traffic.

pub mod session;
pub mod state;

pub use session::{InviteSession, INVITE_USAGE_NAME, INVITE_USAGE_PRIORITY};
pub use state::InviteState;
