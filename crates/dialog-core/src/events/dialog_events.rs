//! Dialog lifecycle events
//!
//! Emitted by dialogs through their [`UserAgent`](crate::manager::UserAgent)
//! when an event sender is configured.

use serde::{Deserialize, Serialize};

use crate::dialog::{DialogId, DialogRole};

/// Dialog lifecycle events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogEvent {
    /// Dialog created by `create_uac` or `create_uas`
    Created {
        dialog_id: DialogId,
        role: DialogRole,
    },

    /// First 1xx/2xx to the initial request sent or received
    Established {
        dialog_id: DialogId,
    },

    /// A response with a new To tag created a sibling dialog
    Forked {
        original: DialogId,
        forked: DialogId,
    },

    /// Dialog destroyed and unregistered
    Terminated {
        dialog_id: DialogId,
    },
}

impl DialogEvent {
    /// Dialog the event is about (the new dialog for `Forked`)
    pub fn dialog_id(&self) -> &DialogId {
        match self {
            DialogEvent::Created { dialog_id, .. }
            | DialogEvent::Established { dialog_id }
            | DialogEvent::Terminated { dialog_id } => dialog_id,
            DialogEvent::Forked { forked, .. } => forked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes() {
        let event = DialogEvent::Terminated {
            dialog_id: DialogId::new("abc", "1", Some("2".into())),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Terminated"));
        let back: DialogEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.dialog_id().local_tag, "1");
    }
}
