// SDP Origin (o=) line parsing

use nom::{
    bytes::complete::take_till1,
    character::complete::{digit1, space1},
    combinator::map_res,
    sequence::tuple,
    IResult,
};

use crate::error::{Error, Result};
use crate::types::sdp::Origin;

fn token(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

fn number(input: &str) -> IResult<&str, u64> {
    map_res(digit1, str::parse::<u64>)(input)
}

/// Use nom to parse the origin value
///
/// Network and address types are taken as written; whether they are
/// acceptable is decided by validation.
pub fn parse_origin_nom(input: &str) -> IResult<&str, Origin> {
    // <username> <sess-id> <sess-version> <nettype> <addrtype> <unicast-address>
    let (remainder, (username, _, sess_id, _, sess_version, _, net_type, _, addr_type, _, addr)) =
        tuple((
            token, space1, number, space1, number, space1, token, space1, token, space1, token,
        ))(input)?;

    Ok((
        remainder,
        Origin {
            username: username.to_string(),
            sess_id,
            sess_version,
            net_type: net_type.to_string(),
            addr_type: addr_type.to_string(),
            unicast_address: addr.to_string(),
        },
    ))
}

/// Parses an origin value (without the `o=` prefix) into an [`Origin`]
pub fn parse_origin_line(value: &str) -> Result<Origin> {
    match parse_origin_nom(value.trim()) {
        Ok((remainder, origin)) if remainder.trim().is_empty() => Ok(origin),
        Ok(_) => Err(Error::SdpParsingError(format!(
            "Invalid o= line format (extra content): {}",
            value
        ))),
        Err(_) => Err(Error::SdpParsingError(format!("Invalid o= line format: {}", value))),
    }
}
