//! # SIP Request Message
//!
//! Mutable request representation for the outgoing send path. Headers are an
//! ordered list; a name may occur several times and each entry carries its
//! [`HeaderOrigin`].
//!
//! ## Examples
//!
//! ```rust
//! use rvoip_sip_message::prelude::*;
//!
//! let mut request = Request::new(Method::Invite, "sip:bob@biloxi.com")
//!     .with_header(HeaderName::From, "Alice <sip:alice@atlanta.com>;tag=1928301774").unwrap()
//!     .with_header(HeaderName::To, "Bob <sip:bob@biloxi.com>").unwrap()
//!     .with_header(HeaderName::CSeq, "1 INVITE").unwrap();
//!
//! request.add_header(Header::custom(HeaderName::Other("X-Account".into()), "42").unwrap());
//!
//! assert_eq!(request.cseq().unwrap().seq, 1);
//! assert_eq!(request.from_addr().unwrap().tag(), Some("1928301774"));
//! assert!(request.header(&HeaderName::Other("x-account".into())).unwrap().is_custom());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cseq::CSeq;
use crate::error::Result;
use crate::header::{Header, HeaderName};
use crate::method::Method;
use crate::name_addr::NameAddr;

/// A SIP request message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// The method of the request
    pub method: Method,
    /// The request URI
    pub uri: String,
    /// Headers in wire order
    pub headers: Vec<Header>,
}

impl Request {
    /// Creates a request with no headers
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Request {
            method,
            uri: uri.into(),
            headers: Vec::new(),
        }
    }

    /// Appends a stack-originated header, for building requests fluently
    pub fn with_header(mut self, name: HeaderName, value: impl Into<String>) -> Result<Self> {
        self.headers.push(Header::new(name, value)?);
        Ok(self)
    }

    /// Returns the method of the request
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the first header with the given name
    pub fn header(&self, name: &HeaderName) -> Option<&Header> {
        self.headers.iter().find(|h| h.name == *name)
    }

    /// Returns every header with the given name, in order
    pub fn headers_named<'a>(&'a self, name: &'a HeaderName) -> impl Iterator<Item = &'a Header> + 'a {
        self.headers.iter().filter(move |h| h.name == *name)
    }

    /// Replaces every header of this name with `header`
    ///
    /// The replacement takes the position of the first removed entry, or is
    /// appended if the name was not present.
    pub fn set_header(&mut self, header: Header) {
        match self.headers.iter().position(|h| h.name == header.name) {
            Some(pos) => {
                let name = header.name.clone();
                self.headers[pos] = header;
                let mut index = 0;
                self.headers.retain(|h| {
                    let keep = index <= pos || h.name != name;
                    index += 1;
                    keep
                });
            }
            None => self.headers.push(header),
        }
    }

    /// Appends a header, keeping any existing values of the same name
    pub fn add_header(&mut self, header: Header) {
        self.headers.push(header);
    }

    /// Removes the headers matching `predicate`, returning how many were removed
    pub fn remove_headers_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Header) -> bool,
    {
        let before = self.headers.len();
        self.headers.retain(|h| !predicate(h));
        before - self.headers.len()
    }

    /// Parsed From header, if present and well formed
    pub fn from_addr(&self) -> Option<NameAddr> {
        self.parsed(&HeaderName::From)
    }

    /// Parsed To header, if present and well formed
    pub fn to_addr(&self) -> Option<NameAddr> {
        self.parsed(&HeaderName::To)
    }

    /// Parsed CSeq header, if present and well formed
    pub fn cseq(&self) -> Option<CSeq> {
        let header = self.header(&HeaderName::CSeq)?;
        match header.value.parse() {
            Ok(cseq) => Some(cseq),
            Err(e) => {
                debug!("Ignoring malformed CSeq header {:?}: {}", header.value, e);
                None
            }
        }
    }

    fn parsed(&self, name: &HeaderName) -> Option<NameAddr> {
        let header = self.header(name)?;
        match NameAddr::parse(&header.value) {
            Ok(addr) => Some(addr),
            Err(e) => {
                debug!("Ignoring malformed {} header {:?}: {}", name, header.value, e);
                None
            }
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} SIP/2.0\r\n", self.method, self.uri)?;
        for header in &self.headers {
            write!(f, "{}\r\n", header)?;
        }
        f.write_str("\r\n")
    }
}
