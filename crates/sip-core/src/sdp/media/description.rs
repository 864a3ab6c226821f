// Media description (m=) line parsing

use nom::{
    bytes::complete::take_till1,
    character::complete::{char, digit1, space0, space1},
    combinator::{map_res, opt},
    multi::separated_list0,
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::{Error, Result};
use crate::types::sdp::MediaDescription;

fn token(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

/// `<port>[/<number of ports>]`
pub(crate) fn parse_port_and_count(input: &str) -> IResult<&str, (u16, Option<u16>)> {
    let port = map_res(digit1, str::parse::<u16>);
    let count = opt(preceded(char('/'), map_res(digit1, str::parse::<u16>)));
    tuple((port, count))(input)
}

/// Parse a media description line using nom
/// Format: `<media> <port>[/<port-count>] <proto> <fmt> [<fmt>]*`
///
/// A line without formats is accepted here; validation decides whether
/// that is allowed for the line's port.
pub fn parse_media_description_nom(input: &str) -> IResult<&str, MediaDescription> {
    let (input, (media, _, (port, port_count), _, protocol)) =
        tuple((token, space1, parse_port_and_count, space1, token))(input)?;
    let (input, _) = space0(input)?;
    let (input, formats) = separated_list0(space1, token)(input)?;

    let mut desc = MediaDescription::new(
        media,
        port,
        protocol,
        formats.into_iter().map(str::to_string).collect(),
    );
    desc.port_count = port_count;
    Ok((input, desc))
}

/// Parse an m= value (without the `m=` prefix)
pub fn parse_media_description_line(value: &str) -> Result<MediaDescription> {
    match parse_media_description_nom(value.trim()) {
        Ok((remainder, media)) if remainder.trim().is_empty() => Ok(media),
        _ => Err(Error::SdpParsingError(format!("Invalid m= line format: {}", value))),
    }
}
