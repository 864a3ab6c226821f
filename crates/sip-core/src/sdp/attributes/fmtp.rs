//! `a=fmtp:<format> <format specific parameters>`
//!
//! The parameter string is kept exactly as received.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parsed fmtp attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FmtpAttribute {
    pub format: String,
    pub params: String,
}

impl FromStr for FmtpAttribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (format, params) = s
            .split_once(char::is_whitespace)
            .ok_or_else(|| Error::SdpParsingError(format!("Invalid fmtp: {}", s)))?;
        if format.is_empty() {
            return Err(Error::SdpParsingError(format!("Invalid fmtp: {}", s)));
        }
        Ok(FmtpAttribute {
            format: format.to_string(),
            params: params.to_string(),
        })
    }
}

impl fmt::Display for FmtpAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.format, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_are_preserved_verbatim() {
        let text = "96 profile-level-id=42e01f; packetization-mode=1 ;x=Y";
        let fmtp: FmtpAttribute = text.parse().unwrap();
        assert_eq!(fmtp.format, "96");
        assert_eq!(fmtp.params, "profile-level-id=42e01f; packetization-mode=1 ;x=Y");
        assert_eq!(fmtp.to_string(), text);
    }

    #[test]
    fn test_rejects_missing_params() {
        assert!("96".parse::<FmtpAttribute>().is_err());
    }
}
