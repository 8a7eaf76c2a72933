//! SIP request methods

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// SIP request method
///
/// Covers the methods defined by RFC 3261 and its common extensions. Any
/// other valid token is carried as [`Method::Extension`].
///
/// # Examples
///
/// ```rust
/// use rvoip_sip_message::Method;
/// use std::str::FromStr;
///
/// assert_eq!(Method::from_str("INVITE").unwrap(), Method::Invite);
/// assert_eq!(Method::Invite.as_str(), "INVITE");
/// assert!(Method::Invite.matches_ignore_case("invite"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Invite,
    Ack,
    Bye,
    Cancel,
    Register,
    Options,
    Prack,
    Subscribe,
    Notify,
    Publish,
    Info,
    Refer,
    Message,
    Update,
    /// Extension method token
    Extension(String),
}

impl Method {
    /// Returns the method token as it appears on the wire
    pub fn as_str(&self) -> &str {
        match self {
            Method::Invite => "INVITE",
            Method::Ack => "ACK",
            Method::Bye => "BYE",
            Method::Cancel => "CANCEL",
            Method::Register => "REGISTER",
            Method::Options => "OPTIONS",
            Method::Prack => "PRACK",
            Method::Subscribe => "SUBSCRIBE",
            Method::Notify => "NOTIFY",
            Method::Publish => "PUBLISH",
            Method::Info => "INFO",
            Method::Refer => "REFER",
            Method::Message => "MESSAGE",
            Method::Update => "UPDATE",
            Method::Extension(token) => token,
        }
    }

    /// Case-insensitive comparison against a configured method name
    pub fn matches_ignore_case(&self, name: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(name.trim())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INVITE" => Ok(Method::Invite),
            "ACK" => Ok(Method::Ack),
            "BYE" => Ok(Method::Bye),
            "CANCEL" => Ok(Method::Cancel),
            "REGISTER" => Ok(Method::Register),
            "OPTIONS" => Ok(Method::Options),
            "PRACK" => Ok(Method::Prack),
            "SUBSCRIBE" => Ok(Method::Subscribe),
            "NOTIFY" => Ok(Method::Notify),
            "PUBLISH" => Ok(Method::Publish),
            "INFO" => Ok(Method::Info),
            "REFER" => Ok(Method::Refer),
            "MESSAGE" => Ok(Method::Message),
            "UPDATE" => Ok(Method::Update),
            other if crate::header::is_token(other) => Ok(Method::Extension(other.to_string())),
            other => Err(Error::InvalidMethod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_str() {
        assert_eq!(Method::from_str("REGISTER").unwrap(), Method::Register);
        assert_eq!(Method::from_str("MESSAGE").unwrap(), Method::Message);

        // Method names are case-sensitive on the wire
        assert_eq!(
            Method::from_str("invite").unwrap(),
            Method::Extension("invite".to_string())
        );

        assert!(Method::from_str("").is_err());
        assert!(Method::from_str("IN VITE").is_err());
    }

    #[test]
    fn test_matches_ignore_case() {
        assert!(Method::Invite.matches_ignore_case("INVITE"));
        assert!(Method::Invite.matches_ignore_case("Invite"));
        assert!(Method::Invite.matches_ignore_case(" invite "));
        assert!(!Method::Invite.matches_ignore_case("REGISTER"));
        assert!(Method::Extension("FOO".into()).matches_ignore_case("foo"));
    }
}
