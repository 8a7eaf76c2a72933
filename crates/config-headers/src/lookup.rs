//! Outbound proxy discovery for `${lookup.srv}`
//!
//! The injector asks a [`ServerLookup`] for the proxy serving the account
//! address. Lookups never fail across this boundary: every error, including
//! the caller-side timeout, collapses to [`LookupOutcome::Unresolved`].

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use tracing::{debug, warn};

use crate::config::InjectorConfig;

/// Result of a proxy lookup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LookupOutcome {
    Resolved(String),
    #[default]
    Unresolved,
}

impl LookupOutcome {
    /// Resolved address, if any
    pub fn resolved(&self) -> Option<&str> {
        match self {
            LookupOutcome::Resolved(addr) => Some(addr),
            LookupOutcome::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, LookupOutcome::Resolved(_))
    }
}

impl From<Option<String>> for LookupOutcome {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(addr) if !addr.trim().is_empty() => LookupOutcome::Resolved(addr.trim().to_string()),
            _ => LookupOutcome::Unresolved,
        }
    }
}

/// Discovers the proxy/server address for an account address
#[async_trait]
pub trait ServerLookup: Send + Sync {
    async fn lookup(&self, server_address: &str) -> LookupOutcome;
}

/// Resolver from the system configuration, bounded by the lookup timeout
///
/// Falls back to the default upstream configuration when the system
/// configuration cannot be read.
pub(crate) fn system_resolver(config: &InjectorConfig) -> TokioAsyncResolver {
    let (resolver_config, mut opts) = match hickory_resolver::system_conf::read_system_conf() {
        Ok(conf) => conf,
        Err(e) => {
            warn!("Failed to read system resolver configuration, using defaults: {}", e);
            (ResolverConfig::default(), ResolverOpts::default())
        }
    };
    opts.timeout = config.lookup_timeout();
    TokioAsyncResolver::tokio(resolver_config, opts)
}

/// SRV-based proxy discovery
///
/// Queries `<service>.<address>` (by default `_sip._udp.<address>`), picks the
/// best target by priority then weight, and returns the first address record
/// of that target.
#[derive(Clone)]
pub struct SrvServerLookup {
    resolver: TokioAsyncResolver,
    service: String,
}

impl SrvServerLookup {
    /// Creates a lookup using the system resolver configuration
    pub fn from_system(config: &InjectorConfig) -> Self {
        SrvServerLookup {
            resolver: system_resolver(config),
            service: config.srv_service.trim_end_matches('.').to_string(),
        }
    }

    /// Creates a lookup with an explicit resolver configuration
    pub fn with_config(config: ResolverConfig, opts: ResolverOpts, service: &str) -> Self {
        SrvServerLookup {
            resolver: TokioAsyncResolver::tokio(config, opts),
            service: service.trim_end_matches('.').to_string(),
        }
    }

    /// SRV query name for an account address
    pub fn srv_name(&self, server_address: &str) -> String {
        format!("{}.{}.", self.service, server_address.trim().trim_end_matches('.'))
    }

    async fn resolve(&self, server_address: &str) -> anyhow::Result<String> {
        let srv_name = self.srv_name(server_address);
        let srv = self
            .resolver
            .srv_lookup(srv_name.as_str())
            .await
            .with_context(|| format!("SRV lookup for {}", srv_name))?;

        let target = srv
            .iter()
            .min_by_key(|rec| (rec.priority(), std::cmp::Reverse(rec.weight())))
            .map(|rec| rec.target().to_utf8())
            .ok_or_else(|| anyhow!("No SRV records for {}", srv_name))?;
        let target = target.trim_end_matches('.');
        debug!("SRV {} selected target {}", srv_name, target);

        if let Ok(ip) = target.parse::<IpAddr>() {
            return Ok(ip.to_string());
        }

        let ips = self
            .resolver
            .lookup_ip(target)
            .await
            .with_context(|| format!("address lookup for {}", target))?;
        ips.iter()
            .next()
            .map(|ip| ip.to_string())
            .ok_or_else(|| anyhow!("No address records for {}", target))
    }
}

#[async_trait]
impl ServerLookup for SrvServerLookup {
    async fn lookup(&self, server_address: &str) -> LookupOutcome {
        match self.resolve(server_address).await {
            Ok(addr) => LookupOutcome::Resolved(addr),
            Err(e) => {
                warn!("Proxy lookup for {} failed: {:#}", server_address, e);
                LookupOutcome::Unresolved
            }
        }
    }
}

/// Fixed answers, keyed by account address
#[derive(Debug, Clone, Default)]
pub struct StaticServerLookup {
    entries: HashMap<String, String>,
    fallback: Option<String>,
}

impl StaticServerLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `server` for every address
    pub fn always(server: impl Into<String>) -> Self {
        StaticServerLookup {
            entries: HashMap::new(),
            fallback: Some(server.into()),
        }
    }

    /// Answers `server` for `address`
    pub fn with_entry(mut self, address: impl Into<String>, server: impl Into<String>) -> Self {
        self.entries.insert(address.into(), server.into());
        self
    }
}

#[async_trait]
impl ServerLookup for StaticServerLookup {
    async fn lookup(&self, server_address: &str) -> LookupOutcome {
        self.entries
            .get(server_address)
            .or(self.fallback.as_ref())
            .cloned()
            .into()
    }
}

/// Lookup that never resolves
#[derive(Debug, Clone, Copy, Default)]
pub struct NoServerLookup;

#[async_trait]
impl ServerLookup for NoServerLookup {
    async fn lookup(&self, _server_address: &str) -> LookupOutcome {
        LookupOutcome::Unresolved
    }
}

/// Runs `lookup` bounded by `timeout`; a timeout counts as unresolved
pub async fn lookup_with_timeout(
    lookup: &dyn ServerLookup,
    server_address: &str,
    timeout: Duration,
) -> LookupOutcome {
    match tokio::time::timeout(timeout, lookup.lookup(server_address)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!("Proxy lookup for {} timed out after {:?}", server_address, timeout);
            LookupOutcome::Unresolved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StalledLookup;

    #[async_trait]
    impl ServerLookup for StalledLookup {
        async fn lookup(&self, _server_address: &str) -> LookupOutcome {
            tokio::time::sleep(Duration::from_secs(30)).await;
            LookupOutcome::Resolved("never".into())
        }
    }

    #[test]
    fn test_outcome_from_option() {
        assert_eq!(LookupOutcome::from(Some(" 10.0.0.1 ".to_string())), LookupOutcome::Resolved("10.0.0.1".into()));
        assert_eq!(LookupOutcome::from(Some("".to_string())), LookupOutcome::Unresolved);
        assert_eq!(LookupOutcome::from(None), LookupOutcome::Unresolved);
    }

    #[tokio::test]
    async fn test_static_lookup() {
        let lookup = StaticServerLookup::new().with_entry("ims.example.net", "10.1.1.1");
        assert_eq!(lookup.lookup("ims.example.net").await.resolved(), Some("10.1.1.1"));
        assert!(!lookup.lookup("other.example.net").await.is_resolved());

        let lookup = StaticServerLookup::always("10.2.2.2");
        assert_eq!(lookup.lookup("anything").await.resolved(), Some("10.2.2.2"));
    }

    #[tokio::test]
    async fn test_timeout_collapses_to_unresolved() {
        let outcome = lookup_with_timeout(&StalledLookup, "ims.example.net", Duration::from_millis(20)).await;
        assert_eq!(outcome, LookupOutcome::Unresolved);
    }

    #[tokio::test]
    async fn test_srv_name() {
        let lookup = SrvServerLookup::with_config(
            ResolverConfig::default(),
            ResolverOpts::default(),
            "_sip._udp",
        );
        assert_eq!(lookup.srv_name("ims.example.net"), "_sip._udp.ims.example.net.");
        assert_eq!(lookup.srv_name("ims.example.net."), "_sip._udp.ims.example.net.");
    }
}
