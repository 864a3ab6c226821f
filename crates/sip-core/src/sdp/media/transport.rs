//! Media transport protocol (`m=` proto field) helpers
//!
//! Offer/answer only needs coarse knowledge of the proto token: whether two
//! lines can be paired and whether an AVPF offer may be answered from an AVP
//! capability.

use std::fmt;

use serde::{Deserialize, Serialize};

const RTP: u32 = 1;
const DTLS: u32 = 2;
const UDP: u32 = 4;
const AVP: u32 = 8;
const SAVP: u32 = 16;
const RTCP_FB: u32 = 32;

/// Known transport profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportProto {
    RtpAvp,
    RtpSavp,
    RtpAvpf,
    RtpSavpf,
    DtlsSavp,
    DtlsSavpf,
    Udp,
    Unknown,
}

impl TransportProto {
    /// Classify a proto token, case-insensitively
    pub fn from_protocol(proto: &str) -> TransportProto {
        match proto.to_ascii_uppercase().as_str() {
            "RTP/AVP" => TransportProto::RtpAvp,
            "RTP/SAVP" => TransportProto::RtpSavp,
            "RTP/AVPF" => TransportProto::RtpAvpf,
            "RTP/SAVPF" => TransportProto::RtpSavpf,
            "UDP/TLS/RTP/SAVP" => TransportProto::DtlsSavp,
            "UDP/TLS/RTP/SAVPF" => TransportProto::DtlsSavpf,
            "UDP" => TransportProto::Udp,
            _ => TransportProto::Unknown,
        }
    }

    fn flags(self) -> u32 {
        match self {
            TransportProto::RtpAvp => RTP | AVP,
            TransportProto::RtpSavp => RTP | SAVP,
            TransportProto::RtpAvpf => RTP | AVP | RTCP_FB,
            TransportProto::RtpSavpf => RTP | SAVP | RTCP_FB,
            TransportProto::DtlsSavp => DTLS | RTP | SAVP,
            TransportProto::DtlsSavpf => DTLS | RTP | SAVP | RTCP_FB,
            TransportProto::Udp => UDP,
            TransportProto::Unknown => 0,
        }
    }

    /// Carries RTP over plain AVP, with or without RTCP feedback
    pub fn is_rtp_avp(self) -> bool {
        self.flags() & (RTP | AVP) == RTP | AVP
    }

    pub fn has_rtcp_fb(self) -> bool {
        self.flags() & RTCP_FB != 0
    }

    pub fn is_secure(self) -> bool {
        self.flags() & SAVP != 0
    }
}

impl fmt::Display for TransportProto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportProto::RtpAvp => "RTP/AVP",
            TransportProto::RtpSavp => "RTP/SAVP",
            TransportProto::RtpAvpf => "RTP/AVPF",
            TransportProto::RtpSavpf => "RTP/SAVPF",
            TransportProto::DtlsSavp => "UDP/TLS/RTP/SAVP",
            TransportProto::DtlsSavpf => "UDP/TLS/RTP/SAVPF",
            TransportProto::Udp => "UDP",
            TransportProto::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// True if lines using protos `a` and `b` may be paired in offer/answer
///
/// Equal tokens always match. Otherwise both must be plain RTP/AVP, with
/// RTCP feedback allowed on either side.
pub fn transport_compare(a: &str, b: &str) -> bool {
    if a.eq_ignore_ascii_case(b) {
        return true;
    }
    TransportProto::from_protocol(a).is_rtp_avp() && TransportProto::from_protocol(b).is_rtp_avp()
}

/// Drop the RTCP feedback suffix of a `.../AVPF` or `.../SAVPF` proto
pub fn trim_rtcp_fb(proto: &str) -> &str {
    if TransportProto::from_protocol(proto).has_rtcp_fb() {
        &proto[..proto.len() - 1]
    } else {
        proto
    }
}
