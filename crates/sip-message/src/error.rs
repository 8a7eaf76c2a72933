//! Error types for the SIP message model

use thiserror::Error;

/// Result type for SIP message operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or mutating SIP messages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Header name is empty or contains characters outside the RFC 3261 token set
    #[error("Invalid header name: {0:?}")]
    InvalidHeaderName(String),

    /// Header value would break message framing
    #[error("Invalid value for header {name}: {reason}")]
    InvalidHeaderValue { name: String, reason: String },

    /// Method token could not be parsed
    #[error("Invalid method: {0:?}")]
    InvalidMethod(String),

    /// CSeq header value could not be parsed
    #[error("Invalid CSeq: {0:?}")]
    InvalidCSeq(String),

    /// From/To style address could not be parsed
    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),
}

impl Error {
    /// Create an invalid header value error
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHeaderValue {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
