// Session description validation
//
// Structural checks applied before an SDP enters offer/answer. Strict mode
// is used for locally generated SDP.

use crate::error::{Error, Result};
use crate::types::sdp::SdpSession;

/// Highest payload type number a format token may carry
pub const MAX_PAYLOAD_TYPE: u32 = 127;

/// First dynamic payload type (RFC 3551)
pub const DYNAMIC_PAYLOAD_TYPE_START: u32 = 96;

fn invalid(message: impl Into<String>) -> Error {
    Error::SdpValidation(message.into())
}

/// Validate a session description
///
/// In strict mode every media line needs a connection (its own or the
/// session's) even when disabled; otherwise only active lines do.
pub fn validate_sdp(sdp: &SdpSession, strict: bool) -> Result<()> {
    let origin = &sdp.origin;
    if origin.username.is_empty() {
        return Err(invalid("origin username is empty"));
    }
    if origin.net_type != "IN" {
        return Err(invalid(format!("unsupported origin network type: {}", origin.net_type)));
    }
    if origin.addr_type != "IP4" && origin.addr_type != "IP6" {
        return Err(invalid(format!("unsupported origin address type: {}", origin.addr_type)));
    }
    if origin.unicast_address.is_empty() {
        return Err(invalid("origin address is empty"));
    }
    if sdp.session_name.is_empty() {
        return Err(invalid("session name is empty"));
    }

    for (idx, m) in sdp.media.iter().enumerate() {
        if m.media.is_empty() {
            return Err(invalid(format!("media {} has no media type", idx)));
        }
        if m.protocol.is_empty() {
            return Err(invalid(format!("media {} has no transport", idx)));
        }
        if m.formats.is_empty() && m.port != 0 {
            return Err(invalid(format!("media {} has no formats", idx)));
        }
        if sdp.connection.is_none() && m.connection.is_none() && (strict || m.port != 0) {
            return Err(invalid(format!("media {} has no connection line", idx)));
        }

        for fmt in &m.formats {
            let Ok(pt) = fmt.parse::<u32>() else {
                continue;
            };
            if pt > MAX_PAYLOAD_TYPE {
                return Err(invalid(format!("media {} payload type {} out of range", idx, pt)));
            }
            if pt >= DYNAMIC_PAYLOAD_TYPE_START && m.port != 0 && m.rtpmap(fmt).is_none() {
                return Err(invalid(format!("media {} dynamic payload type {} has no rtpmap", idx, pt)));
            }
        }
    }

    Ok(())
}
