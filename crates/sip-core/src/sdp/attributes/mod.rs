//! Typed views over SDP attributes
//!
//! Attributes are stored raw on [`crate::types::sdp::MediaDescription`]; the
//! types here parse the few whose structure offer/answer cares about.

pub mod fmtp;
pub mod rtpmap;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use fmtp::FmtpAttribute;
pub use rtpmap::RtpMapAttribute;

/// Media stream direction (RFC 3264 Section 6.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaDirection {
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

impl MediaDirection {
    /// Lookup order used when a media line carries more than one marker
    pub const ALL: [MediaDirection; 4] = [
        MediaDirection::SendOnly,
        MediaDirection::RecvOnly,
        MediaDirection::Inactive,
        MediaDirection::SendRecv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaDirection::SendRecv => "sendrecv",
            MediaDirection::SendOnly => "sendonly",
            MediaDirection::RecvOnly => "recvonly",
            MediaDirection::Inactive => "inactive",
        }
    }

    /// Direction seen from the other end of the stream
    pub fn reversed(&self) -> MediaDirection {
        match self {
            MediaDirection::SendOnly => MediaDirection::RecvOnly,
            MediaDirection::RecvOnly => MediaDirection::SendOnly,
            other => *other,
        }
    }
}

impl fmt::Display for MediaDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sendrecv" => Ok(MediaDirection::SendRecv),
            "sendonly" => Ok(MediaDirection::SendOnly),
            "recvonly" => Ok(MediaDirection::RecvOnly),
            "inactive" => Ok(MediaDirection::Inactive),
            _ => Err(Error::SdpParsingError(format!("Invalid direction: {}", s))),
        }
    }
}
