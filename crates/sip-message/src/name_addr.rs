//! `name-addr` / `addr-spec` values as carried by From and To headers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parser::{self, Param};

/// Address with optional display name and header parameters
///
/// The URI is kept as the exact string found on the wire; callers that
/// rewrite it textually rely on it not being normalised.
///
/// # Examples
///
/// ```rust
/// use rvoip_sip_message::NameAddr;
///
/// let addr = NameAddr::parse("\"Alice\" <sip:alice@atlanta.com;transport=tcp>;tag=1928301774").unwrap();
/// assert_eq!(addr.display_name.as_deref(), Some("Alice"));
/// assert_eq!(addr.uri, "sip:alice@atlanta.com;transport=tcp");
/// assert_eq!(addr.tag(), Some("1928301774"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAddr {
    pub display_name: Option<String>,
    pub uri: String,
    pub params: Vec<Param>,
}

impl NameAddr {
    /// Creates an address from a bare URI
    pub fn new(uri: impl Into<String>) -> Self {
        NameAddr {
            display_name: None,
            uri: uri.into(),
            params: Vec::new(),
        }
    }

    /// Sets the display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets or replaces the `tag` parameter
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.set_tag(tag);
        self
    }

    /// Parses a From/To header value in name-addr or addr-spec form
    ///
    /// Quoted display names may contain `<`, `>` and `;`. In the addr-spec
    /// form everything after the first `;` is a header parameter.
    pub fn parse(value: &str) -> Result<Self> {
        let (_, ((display_name, uri), params)) =
            parser::address_value(value).map_err(|_| Error::InvalidAddress(value.trim().to_string()))?;

        let uri = uri.trim();
        if uri.is_empty() {
            return Err(Error::InvalidAddress(value.trim().to_string()));
        }

        Ok(NameAddr {
            display_name: display_name.filter(|d| !d.trim().is_empty()),
            uri: uri.to_string(),
            params,
        })
    }

    /// Returns the value of a header parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_deref())
    }

    /// Returns the dialog tag, if any
    pub fn tag(&self) -> Option<&str> {
        self.param("tag")
    }

    /// Sets or replaces the `tag` parameter
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        match self.params.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case("tag")) {
            Some((_, v)) => *v = Some(tag),
            None => self.params.push(("tag".to_string(), Some(tag))),
        }
    }
}

impl FromStr for NameAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NameAddr::parse(s)
    }
}

impl fmt::Display for NameAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.display_name {
            write!(f, "\"{}\" ", name)?;
        }
        write!(f, "<{}>", self.uri)?;
        for (name, value) in &self.params {
            match value {
                Some(v) => write!(f, ";{}={}", name, v)?,
                None => write!(f, ";{}", name)?,
            }
        }
        Ok(())
    }
}

/// Splits a URI into its scheme and the remainder
///
/// Only `sip` and `sips` are recognised, matching the schemes the send path
/// strips when extracting user parts.
pub fn split_sip_scheme(uri: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = uri.split_once(':')?;
    if scheme.eq_ignore_ascii_case("sip") || scheme.eq_ignore_ascii_case("sips") {
        Some((scheme, rest))
    } else {
        None
    }
}
