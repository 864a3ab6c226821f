//! Dialog identifier

use std::fmt;

use serde::{Deserialize, Serialize};

/// Call-ID, local tag and remote tag of a dialog (RFC 3261 Section 12)
///
/// The remote tag is `None` until the peer's first tagged response arrives
/// for UAC dialogs, or when the peer sent no From tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DialogId {
    pub call_id: String,
    pub local_tag: String,
    pub remote_tag: Option<String>,
}

impl DialogId {
    pub fn new(
        call_id: impl Into<String>,
        local_tag: impl Into<String>,
        remote_tag: Option<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            local_tag: local_tag.into(),
            remote_tag,
        }
    }

    /// Key of the dialog set this dialog belongs to
    pub fn set_key(&self) -> (String, String) {
        (self.call_id.clone(), self.local_tag.clone())
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};local-tag={};remote-tag={}",
            self.call_id,
            self.local_tag,
            self.remote_tag.as_deref().unwrap_or("-")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let id = DialogId::new("abc@host", "1234", None);
        assert_eq!(id.to_string(), "abc@host;local-tag=1234;remote-tag=-");
        let id = DialogId::new("abc@host", "1234", Some("99".into()));
        assert_eq!(id.to_string(), "abc@host;local-tag=1234;remote-tag=99");
        assert_eq!(id.set_key(), ("abc@host".to_string(), "1234".to_string()));
    }
}
