//! # rvoip-sip-message
//!
//! A small, mutable SIP message model for code that sits on the outgoing
//! send path and needs to read or rewrite headers before a request hits the
//! transport: method, CSeq, From/To addresses and an ordered header list in
//! which every entry records whether it was added by the stack or injected
//! as a custom header.
//!
//! ```rust
//! use rvoip_sip_message::prelude::*;
//!
//! let request = Request::new(Method::Register, "sip:registrar.biloxi.com")
//!     .with_header(HeaderName::To, "Bob <sip:bob@biloxi.com>").unwrap()
//!     .with_header(HeaderName::CSeq, "1826 REGISTER").unwrap();
//!
//! let message = Message::from(request);
//! assert!(message.is_request());
//! ```

pub mod cseq;
pub mod error;
pub mod header;
pub mod message;
pub mod method;
pub mod name_addr;
pub mod parser;
pub mod request;
pub mod response;

pub use cseq::CSeq;
pub use error::{Error, Result};
pub use header::{Header, HeaderName, HeaderOrigin};
pub use message::Message;
pub use method::Method;
pub use name_addr::NameAddr;
pub use request::Request;
pub use response::Response;

/// Common imports
pub mod prelude {
    pub use crate::cseq::CSeq;
    pub use crate::header::{Header, HeaderName, HeaderOrigin};
    pub use crate::message::Message;
    pub use crate::method::Method;
    pub use crate::name_addr::NameAddr;
    pub use crate::request::Request;
    pub use crate::response::Response;
}
