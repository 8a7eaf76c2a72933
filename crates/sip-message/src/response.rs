//! SIP response message

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::header::{Header, HeaderName};

/// A SIP response message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<Header>,
}

impl Response {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Response {
            status,
            reason: reason.into(),
            headers: Vec::new(),
        }
    }

    /// Appends a stack-originated header
    pub fn with_header(mut self, name: HeaderName, value: impl Into<String>) -> Result<Self> {
        self.headers.push(Header::new(name, value)?);
        Ok(self)
    }

    /// Returns the first header with the given name
    pub fn header(&self, name: &HeaderName) -> Option<&Header> {
        self.headers.iter().find(|h| h.name == *name)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIP/2.0 {} {}\r\n", self.status, self.reason)?;
        for header in &self.headers {
            write!(f, "{}\r\n", header)?;
        }
        f.write_str("\r\n")
    }
}
