//! INVITE session states

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of an INVITE session
///
/// ```text
/// UAC: Null → Calling → Early → Connecting → Confirmed → Disconnected
/// UAS: Incoming ─────→ Early → Connecting → Confirmed → Disconnected
/// ```
///
/// `Connecting` means a 2xx was sent and the ACK has not arrived yet; a UAC
/// passes straight from a 2xx to `Confirmed` since it sends the ACK itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InviteState {
    Null,
    Calling,
    Incoming,
    Early,
    Connecting,
    Confirmed,
    Disconnected,
}

impl InviteState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteState::Null => "NULL",
            InviteState::Calling => "CALLING",
            InviteState::Incoming => "INCOMING",
            InviteState::Early => "EARLY",
            InviteState::Connecting => "CONNECTING",
            InviteState::Confirmed => "CONFIRMED",
            InviteState::Disconnected => "DISCONNECTED",
        }
    }

    /// The initial INVITE has not received or sent a final response
    pub fn is_early(&self) -> bool {
        matches!(self, InviteState::Calling | InviteState::Incoming | InviteState::Early)
    }
}

impl fmt::Display for InviteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
