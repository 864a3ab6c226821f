//! Name-addr values used by From, To, Contact, Route and Record-Route
//!
//! ```text
//! "Alice" <sip:alice@atlanta.example.com>;tag=1928301774
//!  ^^^^^   ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^  ^^^^^^^^^^^^^^
//!  display            uri                   header params
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::uri::{parse_params, parse_uri, Param, Uri};
use crate::error::{Error, Result};

/// A SIP name-addr (or addr-spec) with header parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub display_name: Option<String>,
    pub uri: Uri,
    pub params: Vec<Param>,
}

impl Address {
    pub fn new(uri: Uri) -> Self {
        Self {
            display_name: None,
            uri,
            params: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// The `tag` header parameter, if any
    pub fn tag(&self) -> Option<&str> {
        self.param("tag")
    }

    /// Set or replace the `tag` parameter
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        match self.params.iter_mut().find(|p| p.name.eq_ignore_ascii_case("tag")) {
            Some(p) => p.value = Some(tag),
            None => self.params.push(Param::new("tag", Some(tag))),
        }
    }

    /// Remove the `tag` parameter
    pub fn clear_tag(&mut self) {
        self.params.retain(|p| !p.name.eq_ignore_ascii_case("tag"));
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.set_tag(tag);
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .and_then(|p| p.value.as_deref())
    }
}

impl From<Uri> for Address {
    fn from(uri: Uri) -> Self {
        Address::new(uri)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::invalid_header("name-addr", s.to_string());

        if let Some(open) = s.find('<') {
            let close = s[open..].find('>').map(|i| open + i).ok_or_else(invalid)?;
            let display = s[..open].trim().trim_matches('"').trim();
            let uri: Uri = s[open + 1..close].parse()?;
            let (rest, params) = parse_params(s[close + 1..].trim_start()).map_err(|_| invalid())?;
            if !rest.trim().is_empty() {
                return Err(invalid());
            }
            return Ok(Address {
                display_name: (!display.is_empty()).then(|| display.to_string()),
                uri,
                params,
            });
        }

        // addr-spec form: any parameters belong to the header, not the URI
        let (rest, mut uri) = parse_uri(s).map_err(|_| invalid())?;
        if !rest.trim().is_empty() {
            return Err(invalid());
        }
        let params = std::mem::take(&mut uri.params);
        Ok(Address {
            display_name: None,
            uri,
            params,
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.display_name {
            write!(f, "\"{}\" ", name)?;
        }
        write!(f, "<{}>", self.uri)?;
        for param in &self.params {
            write!(f, "{}", param)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_addr_with_tag() {
        let addr: Address = "\"Alice\" <sip:alice@atlanta.example.com>;tag=1928301774"
            .parse()
            .unwrap();
        assert_eq!(addr.display_name.as_deref(), Some("Alice"));
        assert_eq!(addr.uri.user.as_deref(), Some("alice"));
        assert_eq!(addr.tag(), Some("1928301774"));
    }

    #[test]
    fn test_uri_params_stay_inside_brackets() {
        let addr: Address = "<sip:p1.example.com;lr>".parse().unwrap();
        assert!(addr.uri.is_loose_router());
        assert!(addr.params.is_empty());
        assert_eq!(addr.to_string(), "<sip:p1.example.com;lr>");
    }

    #[test]
    fn test_addr_spec_params_belong_to_header() {
        let addr: Address = "sip:bob@biloxi.example.com;tag=a6c85cf".parse().unwrap();
        assert_eq!(addr.tag(), Some("a6c85cf"));
        assert!(addr.uri.params.is_empty());
    }

    #[test]
    fn test_set_tag_replaces_existing() {
        let mut addr: Address = "<sip:bob@biloxi.example.com>;tag=old".parse().unwrap();
        addr.set_tag("new");
        assert_eq!(addr.tag(), Some("new"));
        assert_eq!(addr.params.len(), 1);
        addr.clear_tag();
        assert_eq!(addr.tag(), None);
    }
}
