//! Custom header injection engine
//!
//! For each outgoing request the injector:
//!
//! 1. derives the To domain name into the pass snapshot,
//! 2. parses the `ConfigHeader.*` specs from the account properties,
//! 3. reads the CSeq sequence number,
//! 4. looks up the outbound proxy for the account address (bounded by the
//!    configured timeout),
//! 5. resolves and applies every matching spec.
//!
//! Existing headers that the stack put on the request are overridden.
//! Values this injector added on an earlier pass are dropped and re-added,
//! so re-running a pass never duplicates them, while several specs for the
//! same name in one pass stack up. Dialog-initial headers (Route and
//! P-Asserted-Identity by default) are only applied when the CSeq is 1.
//!
//! A failure on one spec is logged and recorded in the report; it never
//! stops the remaining specs or the request itself.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use rvoip_sip_message::{Header, HeaderName, HeaderOrigin, Message};
use tracing::{debug, info, warn};

use crate::config::InjectorConfig;
use crate::context::{HostFacts, TemplateContext};
use crate::error::InjectResult;
use crate::host::{HostInfo, SystemHostInfo};
use crate::lookup::{lookup_with_timeout, LookupOutcome, ServerLookup, SrvServerLookup};
use crate::properties::{AccountProperties, DerivedKey, PropertySnapshot, ACCOUNT_ADDRESS};
use crate::report::{AppliedHeader, ApplyMode, InjectionReport, SkipReason};
use crate::request::OutgoingRequest;
use crate::spec::HeaderSpecSet;
use crate::template::{self, Token};

/// A spec that passed the method and completeness checks
struct Candidate<'a> {
    index: &'a str,
    name: &'a str,
    template: &'a str,
}

/// Applies account-configured custom headers to outgoing requests
///
/// The injector holds no per-request state and can be shared between tasks
/// behind an `Arc`.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use rvoip_config_headers::{AccountProperties, HeaderInjector, InjectorConfig};
/// use rvoip_config_headers::host::StaticHostInfo;
/// use rvoip_config_headers::lookup::StaticServerLookup;
/// use rvoip_sip_message::prelude::*;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let injector = HeaderInjector::new(
///     InjectorConfig::default(),
///     Arc::new(StaticServerLookup::always("10.0.0.1")),
///     Arc::new(StaticHostInfo::default()),
/// ).unwrap();
///
/// let props = AccountProperties::new()
///     .with("DOMAIN", "example.com")
///     .with("ConfigHeader.1.Name", "X-Domain")
///     .with("ConfigHeader.1.Value", "sip:x@${domain}");
///
/// let mut request = Request::new(Method::Invite, "sip:bob@biloxi.com")
///     .with_header(HeaderName::To, "<sip:bob@biloxi.com>").unwrap()
///     .with_header(HeaderName::CSeq, "1 INVITE").unwrap();
///
/// let report = injector.inject(&mut request, &props).await;
/// assert_eq!(report.applied.len(), 1);
/// assert_eq!(
///     request.header(&HeaderName::Other("X-Domain".into())).unwrap().value,
///     "sip:x@example.com"
/// );
/// # }
/// ```
pub struct HeaderInjector {
    config: InjectorConfig,
    dialog_initial: Vec<HeaderName>,
    always_replace: Vec<HeaderName>,
    lookup: Arc<dyn ServerLookup>,
    host: Arc<dyn HostInfo>,
}

impl HeaderInjector {
    /// Creates an injector after validating `config`
    pub fn new(
        config: InjectorConfig,
        lookup: Arc<dyn ServerLookup>,
        host: Arc<dyn HostInfo>,
    ) -> InjectResult<Self> {
        config.validate()?;
        Ok(HeaderInjector {
            dialog_initial: config.dialog_initial_header_names()?,
            always_replace: config.always_replace_header_names()?,
            config,
            lookup,
            host,
        })
    }

    /// Creates an injector backed by DNS SRV discovery and the local host
    pub fn with_system_services(config: InjectorConfig) -> InjectResult<Self> {
        let lookup = Arc::new(SrvServerLookup::from_system(&config));
        let host = Arc::new(SystemHostInfo::from_system(&config));
        Self::new(config, lookup, host)
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.config
    }

    /// Injects into a request; responses are left untouched
    pub async fn inject_message(
        &self,
        message: &mut Message,
        properties: &AccountProperties,
    ) -> Option<InjectionReport> {
        match message {
            Message::Request(request) => Some(self.inject(request, properties).await),
            Message::Response(response) => {
                debug!("Not injecting custom headers into {} response", response.status);
                None
            }
        }
    }

    /// Applies every matching custom header spec to `request`
    pub async fn inject<R>(&self, request: &mut R, properties: &AccountProperties) -> InjectionReport
    where
        R: OutgoingRequest + ?Sized,
    {
        let mut report = InjectionReport::default();
        let mut snapshot = PropertySnapshot::new(properties);

        let to_uri = request.to_address().map(|a| a.uri);
        let domain_name = to_uri.as_deref().map(domain_name_of).unwrap_or_default();
        debug!("Domain name for custom headers: {:?}", domain_name);
        snapshot.set_derived(DerivedKey::DomainName, domain_name);

        let specs = HeaderSpecSet::parse(properties);
        let seq = request.cseq_number();
        let method = request.method().clone();

        let mut candidates = Vec::with_capacity(specs.len());
        for spec in specs.iter() {
            if !spec.applies_to(&method) {
                debug!("Custom header spec {} does not apply to {}", spec.index, method);
                report.skip(
                    &spec.index,
                    SkipReason::MethodMismatch {
                        method: spec.method.clone().unwrap_or_default(),
                    },
                );
                continue;
            }
            match spec.parts() {
                Some((name, template)) => candidates.push(Candidate {
                    index: &spec.index,
                    name,
                    template,
                }),
                None => {
                    debug!("Custom header spec {} is missing its name or value", spec.index);
                    report.skip(&spec.index, SkipReason::Incomplete);
                }
            }
        }

        let lookup_server = self.lookup_server(&snapshot, &candidates).await;
        if let Some(server) = lookup_server.resolved() {
            snapshot.set_derived(DerivedKey::LookupServer, server);
        }

        let host = self.host_facts(&candidates).await;
        let ctx = TemplateContext::from_request(&*request, &snapshot, host);
        report.domain_name = snapshot
            .derived(DerivedKey::DomainName)
            .unwrap_or_default()
            .to_string();
        report.lookup_server = ctx.lookup_server.clone();

        let mut touched = HashSet::new();
        for candidate in &candidates {
            match self.apply(request, &ctx, seq, candidate, &mut touched) {
                Ok(applied) => {
                    if self.config.log_applied_values {
                        info!("Applied custom header {}: {} ({:?})", applied.name, applied.value, applied.mode);
                    } else {
                        info!("Applied custom header {} ({:?})", applied.name, applied.mode);
                    }
                    report.applied.push(applied);
                }
                Err(SkipReason::Rejected(message)) => {
                    warn!(
                        "Cannot create custom header {} (spec {}): {}",
                        candidate.name, candidate.index, message
                    );
                    report.skip(candidate.index, SkipReason::Rejected(message));
                }
                Err(reason) => {
                    debug!("Skipping custom header {} (spec {}): {:?}", candidate.name, candidate.index, reason);
                    report.skip(candidate.index, reason);
                }
            }
        }

        report
    }

    async fn lookup_server(&self, snapshot: &PropertySnapshot<'_>, candidates: &[Candidate<'_>]) -> LookupOutcome {
        let Some(address) = snapshot.get(ACCOUNT_ADDRESS) else {
            debug!("No account address configured, skipping proxy lookup");
            return LookupOutcome::Unresolved;
        };

        if self.config.lookup_on_demand
            && !candidates.iter().any(|c| Token::LookupSrv.appears_in(c.template))
        {
            return LookupOutcome::Unresolved;
        }

        lookup_with_timeout(self.lookup.as_ref(), address, self.config.lookup_timeout()).await
    }

    async fn host_facts(&self, candidates: &[Candidate<'_>]) -> HostFacts {
        let mut facts = HostFacts::default();

        if candidates.iter().any(|c| Token::FromFqdn.appears_in(c.template)) {
            let timeout = self.config.lookup_timeout();
            match tokio::time::timeout(timeout, self.host.fqdn()).await {
                Ok(Ok(fqdn)) => facts.fqdn = Some(fqdn),
                Ok(Err(e)) => warn!("Host name could not be retrieved: {}", e),
                Err(_) => warn!("Host name lookup timed out after {:?}", timeout),
            }
        }
        if candidates.iter().any(|c| Token::FromIp.appears_in(c.template)) {
            match self.host.local_ip().await {
                Ok(ip) => facts.ip = Some(ip),
                Err(e) => warn!("Host ip could not be retrieved: {}", e),
            }
        }

        facts
    }

    fn apply<R>(
        &self,
        request: &mut R,
        ctx: &TemplateContext,
        seq: Option<u32>,
        candidate: &Candidate<'_>,
        touched: &mut HashSet<HeaderName>,
    ) -> Result<AppliedHeader, SkipReason>
    where
        R: OutgoingRequest + ?Sized,
    {
        let name = HeaderName::from_str(candidate.name).map_err(|e| SkipReason::Rejected(e.to_string()))?;

        if self.dialog_initial.contains(&name) && seq != Some(1) {
            return Err(SkipReason::NotDialogInitial { seq });
        }

        let value = template::resolve(candidate.template, ctx);
        let header = Header::custom(name.clone(), value.clone()).map_err(|e| SkipReason::Rejected(e.to_string()))?;

        let existing = request.header(&name).map(|h| h.origin);
        let mode = if self.always_replace.contains(&name) || existing == Some(HeaderOrigin::Stack) {
            request
                .set_header(header)
                .map_err(|e| SkipReason::Rejected(e.to_string()))?;
            ApplyMode::Replaced
        } else {
            if existing == Some(HeaderOrigin::Custom) && !touched.contains(&name) {
                let removed = request.remove_custom_headers(&name);
                debug!("Dropped {} custom {} value(s) from an earlier pass", removed, name);
            }
            request
                .add_header(header)
                .map_err(|e| SkipReason::Rejected(e.to_string()))?;
            ApplyMode::Appended
        };

        touched.insert(name.clone());
        Ok(AppliedHeader {
            index: candidate.index.to_string(),
            name,
            value,
            mode,
        })
    }
}

/// Host part of a To URI, between the first `@` and the first `;`
///
/// Empty unless the URI has both, in that order.
pub fn domain_name_of(to_uri: &str) -> String {
    match (to_uri.find('@'), to_uri.find(';')) {
        (Some(at), Some(semi)) if at < semi => to_uri[at + 1..semi].to_string(),
        _ => String::new(),
    }
}
