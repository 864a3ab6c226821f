//! # SIP URIs
//!
//! A trimmed-down SIP/SIPS/TEL URI (RFC 3261 Section 19.1) covering what the
//! dialog layer needs: scheme, user, host, port and `;name=value` parameters.
//! Parsing is done with `nom`.
//!
//! ```rust
//! use sipneg_sip_core::Uri;
//!
//! let uri: Uri = "sip:alice@example.com:5070;transport=tcp".parse().unwrap();
//! assert_eq!(uri.user.as_deref(), Some("alice"));
//! assert_eq!(uri.port, Some(5070));
//! assert_eq!(uri.param("transport"), Some("tcp"));
//! assert_eq!(uri.to_string(), "sip:alice@example.com:5070;transport=tcp");
//! ```

use std::fmt;
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{char, digit1},
    combinator::{map, map_res, opt},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// URI scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    Sip,
    Sips,
    Tel,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Sip => "sip",
            Scheme::Sips => "sips",
            Scheme::Tel => "tel",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `name[=value]` parameter as found on URIs and name-addr headers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self { name: name.into(), value }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, ";{}={}", self.name, v),
            None => write!(f, ";{}", self.name),
        }
    }
}

/// A SIP, SIPS or TEL URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uri {
    pub scheme: Scheme,
    pub user: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub params: Vec<Param>,
}

impl Uri {
    /// Create a `sip:` URI for a host
    pub fn sip(host: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::Sip,
            user: None,
            host: host.into(),
            port: None,
            params: Vec::new(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.params.push(Param::new(name, value));
        self
    }

    /// Value of a parameter, if present with a value
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .and_then(|p| p.value.as_deref())
    }

    /// True when the URI carries the `lr` (loose routing) flag
    pub fn is_loose_router(&self) -> bool {
        self.params.iter().any(|p| p.name.eq_ignore_ascii_case("lr"))
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-.!%*_+`'~".contains(c)
}

fn is_host_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '+' || c == '_'
}

fn is_user_char(c: char) -> bool {
    !matches!(c, '@' | ';' | '>' | '<' | ' ' | '?' | ':')
}

fn is_param_value_char(c: char) -> bool {
    !matches!(c, ';' | '?' | '>' | '<' | ' ' | ',')
}

fn parse_scheme(input: &str) -> IResult<&str, Scheme> {
    terminated(
        alt((
            map(tag_no_case("sips"), |_| Scheme::Sips),
            map(tag_no_case("sip"), |_| Scheme::Sip),
            map(tag_no_case("tel"), |_| Scheme::Tel),
        )),
        char(':'),
    )(input)
}

fn parse_host(input: &str) -> IResult<&str, String> {
    alt((
        map(delimited(char('['), take_while1(|c| c != ']'), char(']')), |ip: &str| {
            format!("[{}]", ip)
        }),
        map(take_while1(is_host_char), |h: &str| h.to_string()),
    ))(input)
}

fn parse_param(input: &str) -> IResult<&str, Param> {
    map(
        preceded(
            char(';'),
            pair(
                take_while1(is_token_char),
                opt(preceded(char('='), take_while1(is_param_value_char))),
            ),
        ),
        |(name, value): (&str, Option<&str>)| Param::new(name, value.map(str::to_string)),
    )(input)
}

/// Parse a run of `;name[=value]` parameters
pub(crate) fn parse_params(input: &str) -> IResult<&str, Vec<Param>> {
    many0(parse_param)(input)
}

/// nom parser for a URI, leaving any trailing text unconsumed
pub fn parse_uri(input: &str) -> IResult<&str, Uri> {
    let (input, scheme) = parse_scheme(input)?;
    let (input, user) = if scheme == Scheme::Tel {
        (input, None)
    } else {
        opt(terminated(take_while1(is_user_char), char('@')))(input)?
    };
    let (input, host) = parse_host(input)?;
    let (input, port) = opt(preceded(char(':'), map_res(digit1, str::parse::<u16>)))(input)?;
    let (input, params) = parse_params(input)?;

    Ok((
        input,
        Uri {
            scheme,
            user: user.map(str::to_string),
            host,
            port,
            params,
        },
    ))
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match parse_uri(s.trim()) {
            Ok(("", uri)) => Ok(uri),
            Ok((rest, _)) => Err(Error::InvalidUri(format!(
                "{} (unexpected trailing '{}')",
                s, rest
            ))),
            Err(_) => Err(Error::InvalidUri(s.to_string())),
        }
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        f.write_str(&self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        for param in &self.params {
            write!(f, "{}", param)?;
        }
        Ok(())
    }
}
