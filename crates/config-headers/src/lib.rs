//! # rvoip-config-headers
//!
//! Applies custom SIP headers configured on an account to outgoing requests.
//!
//! An account carries properties of the form
//! `ConfigHeader.<index>.Name`, `ConfigHeader.<index>.Value` and optionally
//! `ConfigHeader.<index>.Method`. Each complete group becomes one header on
//! every outgoing request whose method matches. Values are templates whose
//! `${...}` tokens are filled from the request, the account and a few
//! runtime facts; see [`template`] for the full list.
//!
//! Unknown tokens and tokens without a value are left in the output as
//! written.
//!
//! ```rust
//! use std::sync::Arc;
//! use rvoip_config_headers::{AccountProperties, HeaderInjector, InjectorConfig};
//! use rvoip_config_headers::host::StaticHostInfo;
//! use rvoip_config_headers::lookup::NoServerLookup;
//! use rvoip_sip_message::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let injector = HeaderInjector::new(
//!     InjectorConfig::default(),
//!     Arc::new(NoServerLookup),
//!     Arc::new(StaticHostInfo::default()),
//! ).unwrap();
//!
//! let props = AccountProperties::new()
//!     .with("ConfigHeader.1.Name", "X-Callee")
//!     .with("ConfigHeader.1.Value", "${to.userID}")
//!     .with("ConfigHeader.1.Method", "INVITE");
//!
//! let mut invite = Request::new(Method::Invite, "sip:bob@biloxi.com")
//!     .with_header(HeaderName::To, "Bob <sip:bob@biloxi.com>").unwrap()
//!     .with_header(HeaderName::CSeq, "1 INVITE").unwrap();
//!
//! injector.inject(&mut invite, &props).await;
//! assert_eq!(invite.header(&"X-Callee".parse().unwrap()).unwrap().value, "bob");
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod injector;
pub mod lookup;
pub mod properties;
pub mod report;
pub mod request;
pub mod spec;
pub mod template;

pub use config::InjectorConfig;
pub use context::{HostFacts, TemplateContext};
pub use error::{InjectError, InjectResult};
pub use host::{HostInfo, StaticHostInfo, SystemHostInfo};
pub use injector::HeaderInjector;
pub use lookup::{LookupOutcome, NoServerLookup, ServerLookup, SrvServerLookup, StaticServerLookup};
pub use properties::AccountProperties;
pub use report::{AppliedHeader, ApplyMode, InjectionReport, SkipReason, SkippedSpec};
pub use request::OutgoingRequest;
pub use spec::{HeaderSpec, HeaderSpecSet};
pub use template::Token;
