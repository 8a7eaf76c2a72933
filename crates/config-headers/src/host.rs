//! Local host facts for `${from.fqdn}` and `${from.ip}`

use std::net::IpAddr;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use tracing::debug;

use crate::config::InjectorConfig;
use crate::error::{InjectError, InjectResult};
use crate::lookup::system_resolver;

/// Source of the local host name and address
#[async_trait]
pub trait HostInfo: Send + Sync {
    /// Fully qualified name of this host
    async fn fqdn(&self) -> InjectResult<String>;

    /// Address of this host on the outbound interface
    async fn local_ip(&self) -> InjectResult<IpAddr>;
}

/// Reads host facts from the operating system and DNS
///
/// A node name that is already qualified is used as is. Otherwise the
/// outbound address is reverse resolved and the first qualified name wins,
/// falling back to the node name when DNS has nothing better.
#[derive(Clone)]
pub struct SystemHostInfo {
    resolver: TokioAsyncResolver,
}

impl SystemHostInfo {
    /// Uses the system resolver configuration, bounded by the lookup timeout
    pub fn from_system(config: &InjectorConfig) -> Self {
        Self::with_resolver(system_resolver(config))
    }

    pub fn with_resolver(resolver: TokioAsyncResolver) -> Self {
        SystemHostInfo { resolver }
    }

    async fn reverse_names(&self) -> Vec<String> {
        let ip = match self.local_ip().await {
            Ok(ip) => ip,
            Err(e) => {
                debug!("Skipping reverse lookup: {}", e);
                return Vec::new();
            }
        };

        match self.resolver.reverse_lookup(ip).await {
            Ok(lookup) => lookup.iter().map(|ptr| ptr.to_string()).collect(),
            Err(e) => {
                debug!("Reverse lookup for {} failed: {}", ip, e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl HostInfo for SystemHostInfo {
    async fn fqdn(&self) -> InjectResult<String> {
        let node = node_name();
        let node_ref = node.as_ref().ok().map(String::as_str);

        let reverse = match node_ref {
            Some(name) if is_qualified(name) => Vec::new(),
            _ => self.reverse_names().await,
        };

        match select_fqdn(&reverse, node_ref) {
            Some(fqdn) => Ok(fqdn),
            None => Err(node.err().unwrap_or_else(|| InjectError::host_lookup("no host name available"))),
        }
    }

    async fn local_ip(&self) -> InjectResult<IpAddr> {
        local_ip_address::local_ip()
            .map_err(|e| InjectError::host_lookup(format!("local address unavailable: {}", e)))
    }
}

/// Fixed host facts
#[derive(Debug, Clone, Default)]
pub struct StaticHostInfo {
    pub fqdn: Option<String>,
    pub ip: Option<IpAddr>,
}

impl StaticHostInfo {
    pub fn new(fqdn: impl Into<String>, ip: IpAddr) -> Self {
        StaticHostInfo {
            fqdn: Some(fqdn.into()),
            ip: Some(ip),
        }
    }
}

#[async_trait]
impl HostInfo for StaticHostInfo {
    async fn fqdn(&self) -> InjectResult<String> {
        self.fqdn
            .clone()
            .ok_or_else(|| InjectError::host_lookup("no FQDN configured"))
    }

    async fn local_ip(&self) -> InjectResult<IpAddr> {
        self.ip
            .ok_or_else(|| InjectError::host_lookup("no address configured"))
    }
}

/// Node name from `gethostname`, first whitespace-separated word
fn node_name() -> InjectResult<String> {
    let name = hostname::get()
        .map_err(|e| InjectError::host_lookup(format!("hostname unavailable: {}", e)))?
        .into_string()
        .map_err(|raw| InjectError::host_lookup(format!("hostname is not UTF-8: {:?}", raw)))?;
    name.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| InjectError::host_lookup("hostname is empty"))
}

fn is_qualified(name: &str) -> bool {
    let name = name.trim_end_matches('.');
    name.contains('.') && !name.starts_with('.')
}

/// Picks the host FQDN
///
/// Order: a qualified node name, the first qualified reverse name, the node
/// name, then any reverse name. Trailing root dots are dropped.
fn select_fqdn(reverse_names: &[String], node_name: Option<&str>) -> Option<String> {
    let node = node_name.map(str::trim).filter(|n| !n.is_empty());
    let reverse = || {
        reverse_names
            .iter()
            .map(|n| n.trim().trim_end_matches('.'))
            .filter(|n| !n.is_empty())
    };

    node.filter(|n| is_qualified(n))
        .or_else(|| reverse().find(|n| is_qualified(n)))
        .or(node)
        .or_else(|| reverse().next())
        .map(|n| n.trim_end_matches('.').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_fqdn_prefers_qualified_names() {
        assert_eq!(
            select_fqdn(&names(&["pc33.atlanta.com."]), Some("pc33")),
            Some("pc33.atlanta.com".into())
        );
        assert_eq!(
            select_fqdn(&names(&["localhost", "pc33.atlanta.com."]), Some("pc33")),
            Some("pc33.atlanta.com".into())
        );
        // A qualified node name needs no DNS answer
        assert_eq!(
            select_fqdn(&names(&["other.biloxi.com."]), Some("pc33.atlanta.com")),
            Some("pc33.atlanta.com".into())
        );
    }

    #[test]
    fn test_select_fqdn_falls_back_to_node_name() {
        assert_eq!(select_fqdn(&[], Some("vm")), Some("vm".into()));
        assert_eq!(select_fqdn(&names(&["localhost."]), Some("vm")), Some("vm".into()));
        assert_eq!(select_fqdn(&names(&["localhost."]), None), Some("localhost".into()));
        assert_eq!(select_fqdn(&[], Some("  ")), None);
        assert_eq!(select_fqdn(&[], None), None);
    }

    #[test]
    fn test_is_qualified() {
        assert!(is_qualified("pc33.atlanta.com"));
        assert!(is_qualified("pc33.atlanta.com."));
        assert!(!is_qualified("pc33"));
        assert!(!is_qualified("pc33."));
        assert!(!is_qualified(".local"));
    }

    #[tokio::test]
    async fn test_static_host_info() {
        let host = StaticHostInfo::new("pc33.atlanta.com", "192.0.2.4".parse().unwrap());
        assert_eq!(host.fqdn().await.unwrap(), "pc33.atlanta.com");
        assert_eq!(host.local_ip().await.unwrap().to_string(), "192.0.2.4");

        let empty = StaticHostInfo::default();
        assert!(matches!(empty.fqdn().await, Err(InjectError::HostLookup { .. })));
        assert!(empty.local_ip().await.is_err());
    }
}
