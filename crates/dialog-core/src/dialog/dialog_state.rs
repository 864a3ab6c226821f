//! Dialog state, role and reference counters

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dialog lifecycle
///
/// ```text
/// Null ──(1xx/2xx to the initial request)──> Established
///   │                                            │
///   └──────(sessions == 0 && transactions == 0)──┴──> Terminated
/// ```
///
/// Early and confirmed dialogs are both `Established`; the INVITE session
/// keeps the finer-grained state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogState {
    Null,
    Established,
    Terminated,
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogState::Null => write!(f, "Null"),
            DialogState::Established => write!(f, "Established"),
            DialogState::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Whether this side sent (UAC) or received (UAS) the initial request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogRole {
    Uac,
    Uas,
}

/// What keeps a dialog alive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogCounters {
    /// Sessions (usages) that hold the dialog open
    pub sessions: u32,
    /// Transactions bound to the dialog that have not terminated
    pub transactions: u32,
}

impl DialogCounters {
    /// Neither a session nor a transaction is outstanding
    pub fn is_idle(&self) -> bool {
        self.sessions == 0 && self.transactions == 0
    }
}
