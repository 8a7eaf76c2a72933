//! Per-request values that template tokens resolve against
//!
//! A [`TemplateContext`] is built once per request from the request itself,
//! the property snapshot (including the derived lookup server) and, when
//! needed, local host facts. Every token has a resolver method here; each one is pure over the
//! context and returns `None` when its source is missing.

use std::net::IpAddr;

use rvoip_sip_message::name_addr::split_sip_scheme;
use tracing::debug;

use crate::lookup::LookupOutcome;
use crate::properties::{DerivedKey, PropertySnapshot, ACCOUNT_UID, DOMAIN, PLUS_DISABLED, USER_ID};
use crate::request::OutgoingRequest;

/// Local host facts gathered for a pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFacts {
    pub fqdn: Option<String>,
    pub ip: Option<IpAddr>,
}

/// Immutable per-request template inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    /// From URI as found on the request
    pub from_uri: Option<String>,
    /// From dialog tag
    pub from_tag: Option<String>,
    /// To URI as found on the request
    pub to_uri: Option<String>,
    /// Configured domain
    pub domain: Option<String>,
    /// Configured user id
    pub user_id: Option<String>,
    /// Account UID, `user@host`
    pub account_uid: Option<String>,
    pub lookup_server: LookupOutcome,
    pub plus_disabled: bool,
    pub host: HostFacts,
}

impl TemplateContext {
    /// Snapshots everything the tokens need from one request
    pub fn from_request<R>(
        request: &R,
        snapshot: &PropertySnapshot<'_>,
        host: HostFacts,
    ) -> Self
    where
        R: OutgoingRequest + ?Sized,
    {
        let from = request.from_address();
        TemplateContext {
            from_tag: from.as_ref().and_then(|f| f.tag().map(str::to_string)),
            from_uri: from.map(|f| f.uri),
            to_uri: request.to_address().map(|t| t.uri),
            domain: snapshot.get(DOMAIN).map(str::to_string),
            user_id: snapshot.get(USER_ID).map(str::to_string),
            account_uid: snapshot.get(ACCOUNT_UID).map(str::to_string),
            lookup_server: snapshot
                .derived(DerivedKey::LookupServer)
                .map(str::to_string)
                .into(),
            plus_disabled: snapshot.get_bool(PLUS_DISABLED),
            host,
        }
    }

    /// Configured domain, only when non-empty
    fn configured_domain(&self) -> Option<&str> {
        self.domain.as_deref().filter(|d| !d.is_empty())
    }

    /// `${from.address}`
    pub fn from_address(&self) -> Option<String> {
        self.from_uri.clone()
    }

    /// `${from.domain}`: From URI with the configured domain swapped for the
    /// host part of the account UID
    pub fn from_domain(&self) -> Option<String> {
        let uri = self.from_uri.as_deref()?;
        let uid_host = self
            .account_uid
            .as_deref()
            .and_then(|uid| uid.split_once('@'))
            .map(|(_, host)| host);

        match (self.configured_domain(), uid_host) {
            (Some(domain), Some(host)) if uri.contains(domain) => Some(uri.replace(domain, host)),
            _ => Some(uri.to_string()),
        }
    }

    /// `${from.userID}`: user part of the From URI
    pub fn from_user_id(&self) -> Option<String> {
        let uri = self.from_uri.as_deref()?;
        let mut rest = strip_scheme(uri).to_string();
        if let Some(domain) = self.configured_domain() {
            rest = rest.replace(domain, "");
        }
        Some(before_at(&rest).to_string())
    }

    /// `${to.address}`
    pub fn to_address(&self) -> Option<String> {
        self.to_uri.clone()
    }

    /// `${to.userID}`: user part of the To URI
    pub fn to_user_id(&self) -> Option<String> {
        let uri = self.to_uri.as_deref()?;
        Some(before_at(strip_scheme(uri)).to_string())
    }

    /// `${domain}`
    pub fn domain(&self) -> Option<String> {
        self.domain.clone()
    }

    /// `${tag}`
    pub fn tag(&self) -> Option<String> {
        self.from_tag.clone()
    }

    /// `${userID}`: configured user id up to the first `@`
    pub fn user_id(&self) -> Option<String> {
        self.user_id.as_deref().map(|id| before_at(id).to_string())
    }

    /// `${user.domain}`: host part of the To URI, see [`user_domain_of`]
    pub fn user_domain(&self) -> Option<String> {
        self.to_uri.as_deref().map(user_domain_of)
    }

    /// `${from.fqdn}`: From URI with its host replaced by the local FQDN
    ///
    /// Without a local FQDN the From URI is returned as is.
    pub fn from_fqdn(&self) -> Option<String> {
        let uri = self.from_uri.as_deref()?;
        match self.host.fqdn.as_deref() {
            Some(fqdn) => Some(rewrite_with_fqdn(uri, fqdn)),
            None => Some(uri.to_string()),
        }
    }

    /// `${from.ip}`: From URI with its host replaced by the local address
    ///
    /// Without a local address the From URI is returned as is.
    pub fn from_ip(&self) -> Option<String> {
        let uri = self.from_uri.as_deref()?;
        match self.host.ip {
            Some(ip) => Some(rewrite_with_ip(uri, self.configured_domain(), ip)),
            None => Some(uri.to_string()),
        }
    }

    /// `${lookup.srv}`
    pub fn lookup_srv(&self) -> Option<String> {
        self.lookup_server.resolved().map(str::to_string)
    }
}

fn strip_scheme(uri: &str) -> &str {
    split_sip_scheme(uri).map_or(uri, |(_, rest)| rest)
}

fn before_at(s: &str) -> &str {
    s.split_once('@').map_or(s, |(user, _)| user)
}

/// Host part of a To URI
///
/// Starts after the first `@` (or at the beginning when there is none). If
/// the `@` comes after the last `:`, the host ends at the first `;`;
/// otherwise it ends at the last `:`, which strips a trailing port. A
/// missing `;` or an end before the start extends the host to the end of
/// the URI.
///
/// ```rust
/// use rvoip_config_headers::context::user_domain_of;
///
/// assert_eq!(user_domain_of("sip:bob@biloxi.com;transport=tcp"), "biloxi.com");
/// assert_eq!(user_domain_of("sip:bob@192.0.2.4:5060;transport=udp"), "192.0.2.4");
/// assert_eq!(user_domain_of("sip:bob@[2001:db8::1]:5060;transport=tcp"), "[2001:db8::1]");
/// ```
pub fn user_domain_of(uri: &str) -> String {
    let at = uri.find('@');
    let last_colon = uri.rfind(':');

    let at_after_colon = match (at, last_colon) {
        (Some(a), Some(c)) => a > c,
        (Some(_), None) => true,
        (None, _) => false,
    };

    let start = at.map_or(0, |a| a + 1);
    let end = if at_after_colon { uri.find(';') } else { last_colon };

    match end {
        Some(end) if end >= start => uri[start..end].to_string(),
        _ => uri[start..].to_string(),
    }
}

/// Replaces the host of `uri` (after `@`, up to `;`) with `fqdn`, then drops
/// any `_suffix` from the user part
fn rewrite_with_fqdn(uri: &str, fqdn: &str) -> String {
    let Some(at) = uri.find('@') else {
        debug!("From URI {} has no host part to replace with FQDN", uri);
        return uri.to_string();
    };
    let host_end = uri[at..].find(';').map_or(uri.len(), |i| at + i);

    let mut rewritten = format!("{}{}{}", &uri[..=at], fqdn, &uri[host_end..]);

    if let Some(underscore) = rewritten.find('_') {
        if underscore < at {
            rewritten.replace_range(underscore..at, "");
        }
    }
    rewritten
}

/// Replaces the host of `uri` with `ip`
///
/// When the configured domain occurs in the URI only that substring is
/// replaced, preserving port and parameters. Otherwise everything after the
/// first `@` is replaced.
fn rewrite_with_ip(uri: &str, domain: Option<&str>, ip: IpAddr) -> String {
    let host = match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{}]", v6),
    };

    if let Some(domain) = domain.filter(|d| uri.contains(d)) {
        return uri.replacen(domain, &host, 1);
    }

    match uri.find('@') {
        Some(at) => format!("{}{}", &uri[..=at], host),
        None => {
            debug!("From URI {} has no host part to replace with local address", uri);
            uri.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TemplateContext {
        TemplateContext {
            from_uri: Some("sip:alice@example.com".into()),
            from_tag: Some("1928301774".into()),
            to_uri: Some("sip:bob@biloxi.com;transport=udp".into()),
            domain: Some("example.com".into()),
            user_id: Some("alice@example.com".into()),
            account_uid: Some("alice@ims.example.net".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_user_parts() {
        let c = ctx();
        assert_eq!(c.from_user_id().unwrap(), "alice");
        assert_eq!(c.to_user_id().unwrap(), "bob");
        assert_eq!(c.user_id().unwrap(), "alice");

        let c = TemplateContext {
            from_uri: Some("sips:+15551234@example.com".into()),
            to_uri: Some("tel:+15550000".into()),
            ..ctx()
        };
        assert_eq!(c.from_user_id().unwrap(), "+15551234");
        // Non-SIP schemes are left in place
        assert_eq!(c.to_user_id().unwrap(), "tel:+15550000");
    }

    #[test]
    fn test_from_user_id_without_at() {
        // Domain removal leaves the user part when the From host is the domain
        let c = TemplateContext {
            from_uri: Some("sip:example.com".into()),
            ..ctx()
        };
        assert_eq!(c.from_user_id().unwrap(), "");
    }

    #[test]
    fn test_from_domain() {
        assert_eq!(ctx().from_domain().unwrap(), "sip:alice@ims.example.net");

        let c = TemplateContext {
            account_uid: Some("no-at-sign".into()),
            ..ctx()
        };
        assert_eq!(c.from_domain().unwrap(), "sip:alice@example.com");

        let c = TemplateContext {
            from_uri: Some("sip:alice@other.org".into()),
            ..ctx()
        };
        assert_eq!(c.from_domain().unwrap(), "sip:alice@other.org");
    }

    #[test]
    fn test_user_domain_tie_break() {
        assert_eq!(user_domain_of("sip:bob@biloxi.com;transport=udp"), "biloxi.com");
        assert_eq!(user_domain_of("sip:bob@192.0.2.4:5060;transport=udp"), "192.0.2.4");
        assert_eq!(user_domain_of("sip:bob@192.0.2.4:5060"), "192.0.2.4");
        assert_eq!(user_domain_of("sip:bob@[2001:db8::1]:5060;transport=tcp"), "[2001:db8::1]");
        // No '@': starts at the beginning and cuts at the port colon
        assert_eq!(user_domain_of("sip:[2001:db8::1]:5060;transport=tcp"), "sip:[2001:db8::1]");
        // '@' after the last ':' but no ';'
        assert_eq!(user_domain_of("sip:bob@biloxi.com"), "biloxi.com");
        // Bracketed IPv6 without port: the last ':' is inside the brackets
        assert_eq!(user_domain_of("sip:bob@[2001:db8::1];transport=tcp"), "[2001:db8:");
    }

    #[test]
    fn test_from_fqdn() {
        let mut c = TemplateContext {
            from_uri: Some("sip:alice_laptop@example.com;transport=tcp".into()),
            ..ctx()
        };
        assert_eq!(c.from_fqdn().unwrap(), "sip:alice_laptop@example.com;transport=tcp");

        c.host.fqdn = Some("pc33.atlanta.com".into());
        assert_eq!(c.from_fqdn().unwrap(), "sip:alice@pc33.atlanta.com;transport=tcp");

        c.from_uri = Some("sip:alice@example.com".into());
        assert_eq!(c.from_fqdn().unwrap(), "sip:alice@pc33.atlanta.com");

        // Underscores in the host are not part of the user suffix
        c.host.fqdn = Some("pc_33.atlanta.com".into());
        assert_eq!(c.from_fqdn().unwrap(), "sip:alice@pc_33.atlanta.com");

        c.from_uri = Some("sip:example.com".into());
        assert_eq!(c.from_fqdn().unwrap(), "sip:example.com");
    }

    #[test]
    fn test_from_ip() {
        let mut c = ctx();
        assert_eq!(c.from_ip().unwrap(), "sip:alice@example.com");

        c.host.ip = Some("192.0.2.4".parse().unwrap());
        assert_eq!(c.from_ip().unwrap(), "sip:alice@192.0.2.4");

        c.from_uri = Some("sip:alice@example.com:5061;transport=tls".into());
        assert_eq!(c.from_ip().unwrap(), "sip:alice@192.0.2.4:5061;transport=tls");

        c.from_uri = Some("sip:alice@other.org;transport=tls".into());
        assert_eq!(c.from_ip().unwrap(), "sip:alice@192.0.2.4");

        c.host.ip = Some("2001:db8::7".parse().unwrap());
        assert_eq!(c.from_ip().unwrap(), "sip:alice@[2001:db8::7]");
    }

    #[test]
    fn test_missing_sources() {
        let c = TemplateContext::default();
        assert_eq!(c.from_address(), None);
        assert_eq!(c.from_domain(), None);
        assert_eq!(c.from_user_id(), None);
        assert_eq!(c.to_user_id(), None);
        assert_eq!(c.user_domain(), None);
        assert_eq!(c.tag(), None);
        assert_eq!(c.from_fqdn(), None);
        assert_eq!(c.from_ip(), None);
        assert_eq!(c.lookup_srv(), None);
    }

    #[test]
    fn test_from_request_reads_snapshot() {
        use crate::properties::AccountProperties;
        use rvoip_sip_message::{HeaderName, Method, Request};

        let request = Request::new(Method::Invite, "sip:bob@biloxi.com")
            .with_header(HeaderName::From, "\"Alice <Ops>\" <sip:alice@atlanta.com>;tag=88").unwrap()
            .with_header(HeaderName::To, "\"Bob <Sales>\" <sip:bob@biloxi.com>").unwrap();
        let props = AccountProperties::new().with(DOMAIN, "atlanta.com");
        let mut snapshot = PropertySnapshot::new(&props);

        let c = TemplateContext::from_request(&request, &snapshot, HostFacts::default());
        assert_eq!(c.from_uri.as_deref(), Some("sip:alice@atlanta.com"));
        assert_eq!(c.from_tag.as_deref(), Some("88"));
        assert_eq!(c.to_user_id().unwrap(), "bob");
        assert_eq!(c.domain.as_deref(), Some("atlanta.com"));
        assert_eq!(c.lookup_srv(), None);

        snapshot.set_derived(DerivedKey::LookupServer, "10.0.0.9");
        let c = TemplateContext::from_request(&request, &snapshot, HostFacts::default());
        assert_eq!(c.lookup_srv().as_deref(), Some("10.0.0.9"));
    }
}
