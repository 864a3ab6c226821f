//! Session configuration

use serde::{Deserialize, Serialize};
use sipneg_dialog_core::NegotiatorConfig;
use sipneg_sip_core::StatusCode;

/// INVITE session behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Settings for the session's SDP negotiator
    pub negotiator: NegotiatorConfig,

    /// Final response sent when an offer cannot be answered
    pub reject_status_on_failure: StatusCode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            negotiator: NegotiatorConfig::default(),
            reject_status_on_failure: StatusCode::NOT_ACCEPTABLE_HERE,
        }
    }
}

impl SessionConfig {
    pub fn with_negotiator(mut self, negotiator: NegotiatorConfig) -> Self {
        self.negotiator = negotiator;
        self
    }

    pub fn with_reject_status_on_failure(mut self, status: StatusCode) -> Self {
        self.reject_status_on_failure = status;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.negotiator.validate()?;
        if !self.reject_status_on_failure.is_error() {
            return Err(format!(
                "reject_status_on_failure must be a 4xx-6xx code, got {}",
                self.reject_status_on_failure
            ));
        }
        Ok(())
    }
}
