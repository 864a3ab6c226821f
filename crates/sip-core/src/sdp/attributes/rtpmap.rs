//! `a=rtpmap:<payload type> <encoding name>/<clock rate>[/<encoding parameters>]`

use std::fmt;
use std::str::FromStr;

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, digit1, space1},
    combinator::{map_res, opt, rest},
    sequence::preceded,
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parsed rtpmap attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtpMapAttribute {
    /// Format token the mapping applies to, as written
    pub payload_type: String,
    pub encoding_name: String,
    pub clock_rate: u32,
    /// Channel count for audio; free-form for other media
    pub encoding_params: Option<String>,
}

impl RtpMapAttribute {
    /// Encoding parameter text, empty when absent
    pub fn param(&self) -> &str {
        self.encoding_params.as_deref().unwrap_or("")
    }

    pub fn is_telephone_event(&self) -> bool {
        self.encoding_name.eq_ignore_ascii_case("telephone-event")
    }
}

fn parse_rtpmap(input: &str) -> IResult<&str, RtpMapAttribute> {
    let (input, pt) = take_while1(|c: char| !c.is_whitespace())(input)?;
    let (input, _) = space1(input)?;
    let (input, name) = take_while1(|c: char| c != '/' && !c.is_whitespace())(input)?;
    let (input, _) = char('/')(input)?;
    let (input, clock_rate) = map_res(digit1, str::parse::<u32>)(input)?;
    let (input, params) = opt(preceded(char('/'), rest))(input)?;

    Ok((
        input,
        RtpMapAttribute {
            payload_type: pt.to_string(),
            encoding_name: name.to_string(),
            clock_rate,
            encoding_params: params
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        },
    ))
}

impl FromStr for RtpMapAttribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match parse_rtpmap(s.trim()) {
            Ok((remaining, rtpmap)) if remaining.trim().is_empty() => Ok(rtpmap),
            _ => Err(Error::SdpParsingError(format!("Invalid rtpmap: {}", s))),
        }
    }
}

impl fmt::Display for RtpMapAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.payload_type, self.encoding_name, self.clock_rate)?;
        if let Some(params) = &self.encoding_params {
            write!(f, "/{}", params)?;
        }
        Ok(())
    }
}
