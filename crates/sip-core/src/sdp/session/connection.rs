// SDP Connection (c=) line parsing

use nom::{
    bytes::complete::take_till1,
    character::complete::space1,
    sequence::tuple,
    IResult,
};

use crate::error::{Error, Result};
use crate::types::sdp::ConnectionData;

fn token(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

/// `<nettype> <addrtype> <connection-address>`
pub fn parse_connection_nom(input: &str) -> IResult<&str, ConnectionData> {
    let (remainder, (net_type, _, addr_type, _, address)) =
        tuple((token, space1, token, space1, token))(input)?;
    Ok((
        remainder,
        ConnectionData {
            net_type: net_type.to_string(),
            addr_type: addr_type.to_string(),
            address: address.to_string(),
        },
    ))
}

pub fn parse_connection_line(value: &str) -> Result<ConnectionData> {
    match parse_connection_nom(value.trim()) {
        Ok((remainder, conn)) if remainder.trim().is_empty() => Ok(conn),
        _ => Err(Error::SdpParsingError(format!("Invalid c= line format: {}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connection() {
        let c = parse_connection_line("IN IP4 224.2.17.12/127").unwrap();
        assert_eq!(c.net_type, "IN");
        assert_eq!(c.addr_type, "IP4");
        assert_eq!(c.address, "224.2.17.12/127");
        assert_eq!(c.to_string(), "c=IN IP4 224.2.17.12/127");
    }

    #[test]
    fn test_parse_connection_incomplete() {
        assert!(parse_connection_line("IN IP4").is_err());
    }
}
