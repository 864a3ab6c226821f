//! SDP text parser
//!
//! Builds an [`SdpSession`] from RFC 4566 text. Lines are read with
//! [`parse_sdp_line`]; `i=`, `c=`, `b=` and `a=` lines attach to the most
//! recent `m=` section, or to the session before the first one.

pub mod line_parser;

use tracing::debug;

use crate::error::{Error, Result};
use crate::sdp::media::parse_media_description_line;
use crate::sdp::session::{parse_connection_line, parse_origin_line};
use crate::types::sdp::{Bandwidth, MediaDescription, SdpAttribute, SdpSession, TimeDescription};

pub use line_parser::{parse_bandwidth_line, parse_sdp_line, split_attribute};

fn parse_time_line(value: &str) -> Result<TimeDescription> {
    let mut parts = value.split_whitespace();
    let (Some(start), Some(stop), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::SdpParsingError(format!("Invalid t= line format: {}", value)));
    };
    let parse = |s: &str| {
        s.parse::<u64>()
            .map_err(|_| Error::SdpParsingError(format!("Invalid time value: {}", s)))
    };
    Ok(TimeDescription {
        start_time: parse(start)?,
        stop_time: parse(stop)?,
    })
}

fn parse_bandwidth(value: &str) -> Result<Bandwidth> {
    match parse_bandwidth_line(value.trim()) {
        Ok((rest, (bwtype, value))) if rest.trim().is_empty() => Ok(Bandwidth {
            bwtype: bwtype.to_string(),
            value,
        }),
        _ => Err(Error::SdpParsingError(format!("Invalid b= line format: {}", value))),
    }
}

fn parse_attribute(value: &str) -> Result<SdpAttribute> {
    let (name, value) = split_attribute(value);
    if name.is_empty() {
        return Err(Error::SdpParsingError("Empty attribute name".to_string()));
    }
    Ok(SdpAttribute {
        name: name.to_string(),
        value: value.map(str::to_string),
    })
}

/// Parse a complete session description
pub fn parse_sdp(input: &str) -> Result<SdpSession> {
    let mut version = None;
    let mut origin = None;
    let mut session_name = None;
    let mut session_info = None;
    let mut connection = None;
    let mut bandwidths = Vec::new();
    let mut time_descriptions = Vec::new();
    let mut attributes = Vec::new();
    let mut media: Vec<MediaDescription> = Vec::new();

    let mut rest = input;
    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) {
            rest = stripped;
            continue;
        }
        let (remaining, (key, value)) = parse_sdp_line(rest)
            .map_err(|_| Error::SdpParsingError(format!("Malformed SDP line near: {:.40}", rest)))?;
        rest = remaining;

        if key == 'm' {
            media.push(parse_media_description_line(value)?);
            continue;
        }

        match (key, media.last_mut()) {
            ('v', None) => version = Some(value.trim().to_string()),
            ('o', None) => origin = Some(parse_origin_line(value)?),
            ('s', None) => session_name = Some(value.to_string()),
            ('i', None) => session_info = Some(value.to_string()),
            ('i', Some(m)) => m.title = Some(value.to_string()),
            ('c', None) => connection = Some(parse_connection_line(value)?),
            ('c', Some(m)) => m.connection = Some(parse_connection_line(value)?),
            ('b', None) => bandwidths.push(parse_bandwidth(value)?),
            ('b', Some(m)) => m.bandwidths.push(parse_bandwidth(value)?),
            ('t', None) => time_descriptions.push(parse_time_line(value)?),
            ('a', None) => attributes.push(parse_attribute(value)?),
            ('a', Some(m)) => m.attributes.push(parse_attribute(value)?),
            ('v' | 'o' | 's' | 't', Some(_)) => {
                return Err(Error::SdpParsingError(format!(
                    "{}= line is not allowed inside a media section",
                    key
                )));
            }
            (other, _) => debug!("Skipping SDP line {}={}", other, value),
        }
    }

    let version = version.ok_or_else(|| Error::SdpParsingError("Missing v= line".to_string()))?;
    if version != "0" {
        return Err(Error::SdpParsingError(format!("Unsupported SDP version: {}", version)));
    }

    Ok(SdpSession {
        version,
        origin: origin.ok_or_else(|| Error::SdpParsingError("Missing o= line".to_string()))?,
        session_name: session_name.ok_or_else(|| Error::SdpParsingError("Missing s= line".to_string()))?,
        session_info,
        connection,
        bandwidths,
        time_descriptions,
        attributes,
        media,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFER: &str = "v=0\r\n\
o=alice 2890844526 2890844526 IN IP4 host.atlanta.example.com\r\n\
s=-\r\n\
c=IN IP4 host.atlanta.example.com\r\n\
t=0 0\r\n\
m=audio 49170 RTP/AVP 0 8 97\r\n\
a=rtpmap:0 PCMU/8000\r\n\
a=rtpmap:8 PCMA/8000\r\n\
a=rtpmap:97 iLBC/8000\r\n\
a=fmtp:97 mode=30\r\n\
m=video 51372 RTP/AVP 31 32\r\n\
b=AS:256\r\n\
a=rtpmap:31 H261/90000\r\n\
a=rtpmap:32 MPV/90000\r\n\
a=sendonly\r\n";

    #[test]
    fn test_parse_offer() {
        let sdp = parse_sdp(OFFER).unwrap();
        assert_eq!(sdp.origin.sess_id, 2890844526);
        assert_eq!(sdp.session_name, "-");
        assert_eq!(sdp.connection.as_ref().unwrap().address, "host.atlanta.example.com");
        assert_eq!(sdp.media.len(), 2);
        assert_eq!(sdp.media[0].formats, vec!["0", "8", "97"]);
        assert_eq!(sdp.media[0].fmtp("97").unwrap().params, "mode=30");
        assert_eq!(sdp.media[1].bandwidths[0].value, 256);
        assert!(sdp.media[1].has_attribute("sendonly"));
    }

    #[test]
    fn test_display_reproduces_text() {
        let sdp = parse_sdp(OFFER).unwrap();
        assert_eq!(sdp.to_string(), OFFER);
    }

    #[test]
    fn test_lf_line_endings() {
        let text = OFFER.replace("\r\n", "\n");
        let sdp = parse_sdp(&text).unwrap();
        assert_eq!(sdp.media.len(), 2);
    }

    #[test]
    fn test_missing_origin() {
        assert!(parse_sdp("v=0\r\ns=-\r\nt=0 0\r\n").is_err());
    }

    #[test]
    fn test_unknown_lines_are_skipped() {
        let text = "v=0\r\no=- 1 1 IN IP4 10.0.0.1\r\ns=-\r\nu=http://example.com\r\nt=0 0\r\n";
        assert!(parse_sdp(text).is_ok());
    }

    #[test]
    fn test_bad_media_line() {
        let text = "v=0\r\no=- 1 1 IN IP4 10.0.0.1\r\ns=-\r\nt=0 0\r\nm=audio x RTP/AVP 0\r\n";
        assert!(parse_sdp(text).is_err());
    }
}
