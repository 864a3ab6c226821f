//! Configuration for dialog-core
//!
//! ```text
//! DialogConfig        ← per user agent: headers stamped on requests,
//!                       automatic 500 for unhandled requests
//! NegotiatorConfig    ← per SDP negotiator: codec ordering and
//!                       answer matching behavior
//! ```
//!
//! Both derive serde so they can be loaded from the application's own
//! configuration files.

use serde::{Deserialize, Serialize};

/// SDP negotiator behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiatorConfig {
    /// Order answer codecs by the remote offer rather than by local preference
    pub prefer_remote_codec_order: bool,

    /// Put every matching codec in an answer instead of only the first
    pub answer_with_multiple_codecs: bool,

    /// Accept answers whose formats are not a subset-in-order of the offer
    pub allow_asymmetric_media: bool,
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self {
            prefer_remote_codec_order: true,
            answer_with_multiple_codecs: false,
            allow_asymmetric_media: false,
        }
    }
}

impl NegotiatorConfig {
    pub fn with_prefer_remote_codec_order(mut self, prefer: bool) -> Self {
        self.prefer_remote_codec_order = prefer;
        self
    }

    pub fn with_answer_with_multiple_codecs(mut self, multiple: bool) -> Self {
        self.answer_with_multiple_codecs = multiple;
        self
    }

    pub fn with_allow_asymmetric_media(mut self, allow: bool) -> Self {
        self.allow_asymmetric_media = allow;
        self
    }

    /// Every combination is meaningful; kept for symmetry with the other configs
    pub fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Dialog layer behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// User-Agent header added to requests created by dialogs
    pub user_agent: Option<String>,

    /// Max-Forwards value for new requests
    pub max_forwards: u8,

    /// Answer in-dialog requests no usage handled with 500
    pub auto_respond_500: bool,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(format!("sipneg/{}", env!("CARGO_PKG_VERSION"))),
            max_forwards: 70,
            auto_respond_500: true,
        }
    }
}

impl DialogConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn without_user_agent(mut self) -> Self {
        self.user_agent = None;
        self
    }

    pub fn with_max_forwards(mut self, max_forwards: u8) -> Self {
        self.max_forwards = max_forwards;
        self
    }

    pub fn with_auto_respond_500(mut self, enabled: bool) -> Self {
        self.auto_respond_500 = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_forwards == 0 {
            return Err("max_forwards must be greater than zero".to_string());
        }
        if let Some(ua) = &self.user_agent {
            if ua.trim().is_empty() {
                return Err("user_agent must not be blank".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(DialogConfig::default().validate().is_ok());
        assert!(NegotiatorConfig::default().validate().is_ok());
        assert!(NegotiatorConfig::default().prefer_remote_codec_order);
    }

    #[test]
    fn test_invalid_dialog_config() {
        assert!(DialogConfig::default().with_max_forwards(0).validate().is_err());
        assert!(DialogConfig::default().with_user_agent("  ").validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NegotiatorConfig =
            serde_json::from_str(r#"{"answer_with_multiple_codecs": true}"#).unwrap();
        assert!(config.answer_with_multiple_codecs);
        assert!(config.prefer_remote_codec_order);
        assert!(!config.allow_asymmetric_media);
    }
}
