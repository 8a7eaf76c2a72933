//! SIP header names and header values
//!
//! Headers are kept as raw values together with an explicit [`HeaderOrigin`]
//! so that code mutating an outgoing request can tell the headers it added
//! itself apart from the ones produced by the rest of the stack.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Returns true if `c` may appear in an RFC 3261 `token`
pub fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '-' | '.' | '!' | '%' | '*' | '_' | '+' | '`' | '\'' | '~')
}

/// Returns true if `s` is a non-empty RFC 3261 `token`
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

/// SIP header name
///
/// Only the headers the send path needs to reason about get their own
/// variant; everything else is carried as [`HeaderName::Other`]. Header names
/// compare case-insensitively, as required by RFC 3261 section 7.3.1.
///
/// # Examples
///
/// ```rust
/// use rvoip_sip_message::HeaderName;
/// use std::str::FromStr;
///
/// assert_eq!(HeaderName::from_str("f").unwrap(), HeaderName::From);
/// assert_eq!(HeaderName::from_str("p-asserted-identity").unwrap(), HeaderName::PAssertedIdentity);
/// assert_eq!(
///     HeaderName::from_str("X-Custom").unwrap(),
///     HeaderName::from_str("x-custom").unwrap()
/// );
/// assert!(HeaderName::from_str("Bad Name").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HeaderName {
    /// Call-ID: Unique identifier for this call
    CallId,
    /// Contact: Where subsequent requests should be sent
    Contact,
    /// CSeq: Command sequence number
    CSeq,
    /// From: Initiator of the request
    From,
    /// Max-Forwards: Limit on the number of proxies or gateways
    MaxForwards,
    /// To: Logical recipient of the request
    To,
    /// Via: Path taken by the request so far
    Via,
    /// Route: Forced route for a request
    Route,
    /// P-Asserted-Identity: Network asserted identity (RFC 3325)
    PAssertedIdentity,
    /// Any other header
    Other(String),
}

impl HeaderName {
    /// Returns the canonical name of the header
    pub fn as_str(&self) -> &str {
        match self {
            HeaderName::CallId => "Call-ID",
            HeaderName::Contact => "Contact",
            HeaderName::CSeq => "CSeq",
            HeaderName::From => "From",
            HeaderName::MaxForwards => "Max-Forwards",
            HeaderName::To => "To",
            HeaderName::Via => "Via",
            HeaderName::Route => "Route",
            HeaderName::PAssertedIdentity => "P-Asserted-Identity",
            HeaderName::Other(s) => s,
        }
    }
}

impl PartialEq for HeaderName {
    fn eq(&self, other: &Self) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }
}

impl Eq for HeaderName {}

impl Hash for HeaderName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.as_str().bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeaderName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !is_token(s) {
            return Err(Error::InvalidHeaderName(s.to_string()));
        }

        let lower_s = s.to_ascii_lowercase();
        match lower_s.as_str() {
            "call-id" | "i" => Ok(HeaderName::CallId),
            "contact" | "m" => Ok(HeaderName::Contact),
            "cseq" => Ok(HeaderName::CSeq),
            "from" | "f" => Ok(HeaderName::From),
            "max-forwards" => Ok(HeaderName::MaxForwards),
            "to" | "t" => Ok(HeaderName::To),
            "via" | "v" => Ok(HeaderName::Via),
            "route" => Ok(HeaderName::Route),
            "p-asserted-identity" => Ok(HeaderName::PAssertedIdentity),
            _ => Ok(HeaderName::Other(s.to_string())),
        }
    }
}

/// Who put a header on the message
///
/// `Custom` marks headers injected from account configuration; `Stack`
/// covers everything else (dialog layer, transaction layer, application).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HeaderOrigin {
    #[default]
    Stack,
    Custom,
}

/// A single header line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: HeaderName,
    pub value: String,
    pub origin: HeaderOrigin,
}

impl Header {
    /// Creates a stack-originated header, validating the value
    pub fn new(name: HeaderName, value: impl Into<String>) -> Result<Self> {
        Self::with_origin(name, value, HeaderOrigin::Stack)
    }

    /// Creates a header carrying the custom-header marker
    pub fn custom(name: HeaderName, value: impl Into<String>) -> Result<Self> {
        Self::with_origin(name, value, HeaderOrigin::Custom)
    }

    /// Creates a header with an explicit origin
    pub fn with_origin(name: HeaderName, value: impl Into<String>, origin: HeaderOrigin) -> Result<Self> {
        let value = value.into();
        if value.contains(['\r', '\n']) {
            return Err(Error::invalid_value(name.as_str(), "value contains CR or LF"));
        }
        Ok(Header { name, value, origin })
    }

    /// Parses a `Name: value` line into a stack header
    pub fn parse_line(line: &str) -> Result<Self> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::InvalidHeaderName(line.to_string()))?;
        Header::new(name.parse()?, value.trim())
    }

    /// Returns true if the header carries the custom-header marker
    pub fn is_custom(&self) -> bool {
        self.origin == HeaderOrigin::Custom
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_header_name_from_str() {
        assert_eq!(HeaderName::from_str("Via").unwrap(), HeaderName::Via);
        assert_eq!(HeaderName::from_str("v").unwrap(), HeaderName::Via);
        assert_eq!(HeaderName::from_str("t").unwrap(), HeaderName::To);
        assert_eq!(HeaderName::from_str("cSeq").unwrap(), HeaderName::CSeq);
        assert_eq!(HeaderName::from_str("ROUTE").unwrap(), HeaderName::Route);

        let custom = HeaderName::from_str("X-Custom").unwrap();
        assert!(matches!(&custom, HeaderName::Other(s) if s == "X-Custom"));

        assert!(HeaderName::from_str("").is_err());
        assert!(HeaderName::from_str("X Custom").is_err());
        assert!(HeaderName::from_str("X-Custom:").is_err());
    }

    #[test]
    fn test_other_names_compare_case_insensitively() {
        let a = HeaderName::Other("X-Trace".into());
        let b = HeaderName::Other("x-trace".into());
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));

        // An Other spelling of a well-known header still matches it
        assert_eq!(HeaderName::Other("route".into()), HeaderName::Route);
    }

    #[test]
    fn test_header_rejects_line_breaks() {
        assert!(Header::new(HeaderName::Other("X-A".into()), "ok").is_ok());
        let err = Header::new(HeaderName::Other("X-A".into()), "bad\r\nInjected: 1").unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue { .. }));
    }

    #[test]
    fn test_parse_line() {
        let h = Header::parse_line("Max-Forwards: 70").unwrap();
        assert_eq!(h.name, HeaderName::MaxForwards);
        assert_eq!(h.value, "70");
        assert_eq!(h.origin, HeaderOrigin::Stack);
        assert!(Header::parse_line("no colon here").is_err());
    }
}
