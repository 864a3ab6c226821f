//! # SDP data model
//!
//! Owned representation of an RFC 4566 session description. Media lines are
//! kept in a `Vec` because their position is what correlates an offer with
//! its answer; attributes are kept in order with their value text untouched
//! so that `fmtp` parameter strings survive a parse/serialize cycle byte for
//! byte.
//!
//! Parsing lives in [`crate::sdp::parser`]; text rendering is the `Display`
//! implementation below.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sdp::attributes::{FmtpAttribute, MediaDirection, RtpMapAttribute};

/// o= line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub username: String,
    pub sess_id: u64,
    pub sess_version: u64,
    pub net_type: String,
    pub addr_type: String,
    pub unicast_address: String,
}

impl Origin {
    /// An `IN IP4` origin
    pub fn new(username: impl Into<String>, sess_id: u64, sess_version: u64, address: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            sess_id,
            sess_version,
            net_type: "IN".to_string(),
            addr_type: "IP4".to_string(),
            unicast_address: address.into(),
        }
    }
}

/// c= line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionData {
    pub net_type: String,
    pub addr_type: String,
    pub address: String,
}

impl ConnectionData {
    pub fn ipv4(address: impl Into<String>) -> Self {
        Self {
            net_type: "IN".to_string(),
            addr_type: "IP4".to_string(),
            address: address.into(),
        }
    }
}

/// b= line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bandwidth {
    pub bwtype: String,
    pub value: u64,
}

/// t= line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDescription {
    pub start_time: u64,
    pub stop_time: u64,
}

/// a= line, either a property (`a=sendonly`) or a value (`a=rtpmap:0 PCMU/8000`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdpAttribute {
    pub name: String,
    pub value: Option<String>,
}

impl SdpAttribute {
    pub fn property(name: impl Into<String>) -> Self {
        Self { name: name.into(), value: None }
    }

    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// True if this attribute has `name` and its value starts with the
    /// format token `fmt` (as `rtpmap`/`fmtp` values do)
    pub fn is_for_format(&self, name: &str, fmt: &str) -> bool {
        self.name == name
            && self
                .value
                .as_deref()
                .and_then(|v| v.split_whitespace().next())
                .is_some_and(|first| first == fmt)
    }
}

impl fmt::Display for SdpAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "a={}:{}", self.name, v),
            None => write!(f, "a={}", self.name),
        }
    }
}

/// One m= section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescription {
    pub media: String,
    pub port: u16,
    pub port_count: Option<u16>,
    pub protocol: String,
    /// Format tokens; order is preference order
    pub formats: Vec<String>,
    pub title: Option<String>,
    pub connection: Option<ConnectionData>,
    pub bandwidths: Vec<Bandwidth>,
    pub attributes: Vec<SdpAttribute>,
}

impl MediaDescription {
    pub fn new(media: impl Into<String>, port: u16, protocol: impl Into<String>, formats: Vec<String>) -> Self {
        Self {
            media: media.into(),
            port,
            port_count: None,
            protocol: protocol.into(),
            formats,
            title: None,
            connection: None,
            bandwidths: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attr: SdpAttribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn with_connection(mut self, connection: ConnectionData) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn is_active(&self) -> bool {
        self.port != 0
    }

    pub fn find_attribute(&self, name: &str) -> Option<&SdpAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.find_attribute(name).is_some()
    }

    /// First `name` attribute whose value is keyed by format `fmt`
    pub fn find_attribute_for_format(&self, name: &str, fmt: &str) -> Option<&SdpAttribute> {
        self.attributes.iter().find(|a| a.is_for_format(name, fmt))
    }

    pub fn remove_attributes(&mut self, name: &str) {
        self.attributes.retain(|a| a.name != name);
    }

    /// Remove the first `name` attribute keyed by `fmt`, returning it
    pub fn remove_attribute_for_format(&mut self, name: &str, fmt: &str) -> Option<SdpAttribute> {
        let pos = self.attributes.iter().position(|a| a.is_for_format(name, fmt))?;
        Some(self.attributes.remove(pos))
    }

    /// Parsed rtpmap for a format, `None` if absent or malformed
    pub fn rtpmap(&self, fmt: &str) -> Option<RtpMapAttribute> {
        self.find_attribute_for_format("rtpmap", fmt)
            .and_then(|a| a.value.as_deref())
            .and_then(|v| v.parse().ok())
    }

    /// Parsed fmtp for a format
    pub fn fmtp(&self, fmt: &str) -> Option<FmtpAttribute> {
        self.find_attribute_for_format("fmtp", fmt)
            .and_then(|a| a.value.as_deref())
            .and_then(|v| v.parse().ok())
    }

    /// Declared direction; no direction attribute means sendrecv
    pub fn direction(&self) -> MediaDirection {
        MediaDirection::ALL
            .into_iter()
            .find(|dir| self.has_attribute(dir.as_str()))
            .unwrap_or(MediaDirection::SendRecv)
    }

    /// Remove every direction attribute and add one for `dir`, unless it is
    /// sendrecv which is expressed by absence
    pub fn set_direction(&mut self, dir: MediaDirection) {
        for d in MediaDirection::ALL {
            self.remove_attributes(d.as_str());
        }
        if dir != MediaDirection::SendRecv {
            self.attributes.push(SdpAttribute::property(dir.as_str()));
        }
    }

    /// Set the port to zero and drop every attribute
    pub fn deactivate(&mut self) {
        self.port = 0;
        self.attributes.clear();
    }

    /// A copy of this line with port zero and no attributes
    pub fn deactivated_clone(&self) -> Self {
        let mut m = self.clone();
        m.deactivate();
        m
    }
}

/// Content-Type of an SDP body
pub const CONTENT_TYPE_SDP: &str = "application/sdp";

/// A complete SDP session description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdpSession {
    pub version: String,
    pub origin: Origin,
    pub session_name: String,
    pub session_info: Option<String>,
    pub connection: Option<ConnectionData>,
    pub bandwidths: Vec<Bandwidth>,
    pub time_descriptions: Vec<TimeDescription>,
    pub attributes: Vec<SdpAttribute>,
    pub media: Vec<MediaDescription>,
}

impl SdpSession {
    pub fn new(origin: Origin, session_name: impl Into<String>) -> Self {
        Self {
            version: "0".to_string(),
            origin,
            session_name: session_name.into(),
            session_info: None,
            connection: None,
            bandwidths: Vec::new(),
            time_descriptions: vec![TimeDescription { start_time: 0, stop_time: 0 }],
            attributes: Vec::new(),
            media: Vec::new(),
        }
    }

    pub fn with_connection(mut self, connection: ConnectionData) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn with_media(mut self, media: MediaDescription) -> Self {
        self.media.push(media);
        self
    }

    /// Number of media lines with a non-zero port
    pub fn active_media_count(&self) -> usize {
        self.media.iter().filter(|m| m.is_active()).count()
    }

    /// Equal in everything except the origin version
    pub fn same_content_as(&self, other: &SdpSession) -> bool {
        let mut a = self.clone();
        a.origin.sess_version = other.origin.sess_version;
        &a == other
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl FromStr for SdpSession {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::sdp::parser::parse_sdp(s)
    }
}

impl fmt::Display for ConnectionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c={} {} {}", self.net_type, self.addr_type, self.address)
    }
}

impl fmt::Display for SdpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.origin;
        write!(f, "v={}\r\n", self.version)?;
        write!(
            f,
            "o={} {} {} {} {} {}\r\n",
            o.username, o.sess_id, o.sess_version, o.net_type, o.addr_type, o.unicast_address
        )?;
        write!(f, "s={}\r\n", self.session_name)?;
        if let Some(info) = &self.session_info {
            write!(f, "i={}\r\n", info)?;
        }
        if let Some(c) = &self.connection {
            write!(f, "{}\r\n", c)?;
        }
        for b in &self.bandwidths {
            write!(f, "b={}:{}\r\n", b.bwtype, b.value)?;
        }
        for t in &self.time_descriptions {
            write!(f, "t={} {}\r\n", t.start_time, t.stop_time)?;
        }
        for a in &self.attributes {
            write!(f, "{}\r\n", a)?;
        }
        for m in &self.media {
            write!(f, "m={} {}", m.media, m.port)?;
            if let Some(count) = m.port_count {
                write!(f, "/{}", count)?;
            }
            write!(f, " {}", m.protocol)?;
            for fmt_token in &m.formats {
                write!(f, " {}", fmt_token)?;
            }
            f.write_str("\r\n")?;
            if let Some(title) = &m.title {
                write!(f, "i={}\r\n", title)?;
            }
            if let Some(c) = &m.connection {
                write!(f, "{}\r\n", c)?;
            }
            for b in &m.bandwidths {
                write!(f, "b={}:{}\r\n", b.bwtype, b.value)?;
            }
            for a in &m.attributes {
                write!(f, "{}\r\n", a)?;
            }
        }
        Ok(())
    }
}
