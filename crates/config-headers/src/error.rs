//! Error types for custom header injection
//!
//! Nothing in here escapes [`HeaderInjector::inject`](crate::HeaderInjector::inject):
//! per-header failures are logged and recorded in the
//! [`InjectionReport`](crate::InjectionReport). These errors surface from
//! configuration loading and from the host/lookup collaborators.

use thiserror::Error;

/// Result type for header injection operations
pub type InjectResult<T> = Result<T, InjectError>;

/// Errors that can occur around custom header injection
#[derive(Debug, Error)]
pub enum InjectError {
    /// SIP message model rejected a header
    #[error("Header error: {0}")]
    Header(#[from] rvoip_sip_message::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Configuration file could not be parsed
    #[error("Invalid configuration file: {0}")]
    ConfigFormat(#[from] toml::de::Error),

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local host facts (FQDN, IP address) could not be determined
    #[error("Host lookup failed: {message}")]
    HostLookup { message: String },
}

impl InjectError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a host lookup error
    pub fn host_lookup(message: impl Into<String>) -> Self {
        Self::HostLookup {
            message: message.into(),
        }
    }
}
