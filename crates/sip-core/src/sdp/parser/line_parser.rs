//! SDP line parsing
//!
//! Each SDP line has the form `<type>=<value>` where type is a single
//! character. Values are returned without their line ending but otherwise
//! untouched, so attribute text can be carried through unchanged.

use nom::{
    bytes::complete::take_until,
    character::complete::{anychar, char, digit1, not_line_ending},
    combinator::map_res,
    sequence::separated_pair,
    IResult,
};

/// Parse one SDP line into its type character and value
///
/// ```
/// use sipneg_sip_core::sdp::parser::parse_sdp_line;
///
/// let (_, (key, value)) = parse_sdp_line("a=rtpmap:96 VP8/90000").unwrap();
/// assert_eq!(key, 'a');
/// assert_eq!(value, "rtpmap:96 VP8/90000");
/// ```
pub fn parse_sdp_line(input: &str) -> IResult<&str, (char, &str)> {
    let (input, key) = anychar(input)?;
    let (input, _) = char('=')(input)?;
    let (input, value) = not_line_ending(input)?;

    let input = input.trim_start_matches(['\r', '\n']);

    Ok((input, (key, value)))
}

/// Parse a `b=` value, `<bwtype>:<bandwidth>`
pub fn parse_bandwidth_line(input: &str) -> IResult<&str, (&str, u64)> {
    separated_pair(
        take_until(":"),
        char(':'),
        map_res(digit1, str::parse::<u64>),
    )(input)
}

/// Split an `a=` value into name and optional value at the first colon
pub fn split_attribute(value: &str) -> (&str, Option<&str>) {
    match value.split_once(':') {
        Some((name, v)) => (name, Some(v)),
        None => (value, None),
    }
}
