//! CSeq header value

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::method::Method;

/// Command sequence: dialog sequence number plus method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CSeq {
    pub seq: u32,
    pub method: Method,
}

impl CSeq {
    pub fn new(seq: u32, method: Method) -> Self {
        CSeq { seq, method }
    }

    /// True for the first request of a dialog
    pub fn is_dialog_initial(&self) -> bool {
        self.seq == 1
    }
}

impl FromStr for CSeq {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let seq = parts
            .next()
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(|| Error::InvalidCSeq(s.to_string()))?;
        let method = parts
            .next()
            .ok_or_else(|| Error::InvalidCSeq(s.to_string()))?
            .parse()?;
        if parts.next().is_some() {
            return Err(Error::InvalidCSeq(s.to_string()));
        }
        Ok(CSeq { seq, method })
    }
}

impl fmt::Display for CSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.seq, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cseq_parse() {
        let c: CSeq = "314159 INVITE".parse().unwrap();
        assert_eq!(c.seq, 314159);
        assert_eq!(c.method, Method::Invite);
        assert!(!c.is_dialog_initial());
        assert!("1 REGISTER".parse::<CSeq>().unwrap().is_dialog_initial());

        assert!("INVITE".parse::<CSeq>().is_err());
        assert!("1".parse::<CSeq>().is_err());
        assert!("-1 INVITE".parse::<CSeq>().is_err());
        assert!("1 INVITE extra".parse::<CSeq>().is_err());
    }
}
