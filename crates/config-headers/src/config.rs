//! Injector configuration
//!
//! ```rust
//! use rvoip_config_headers::InjectorConfig;
//! use std::time::Duration;
//!
//! let config = InjectorConfig::from_toml_str(r#"
//!     lookup_timeout_ms = 500
//!     lookup_on_demand = true
//! "#).unwrap();
//!
//! assert_eq!(config.lookup_timeout(), Duration::from_millis(500));
//! assert_eq!(config.srv_service, "_sip._udp");
//! assert!(config.validate().is_ok());
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use rvoip_sip_message::HeaderName;
use serde::{Deserialize, Serialize};

use crate::error::{InjectError, InjectResult};

/// Configuration for [`HeaderInjector`](crate::HeaderInjector)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorConfig {
    /// Upper bound on the proxy lookup, in milliseconds
    pub lookup_timeout_ms: u64,

    /// SRV service/protocol labels prepended to the account address
    pub srv_service: String,

    /// Only run the proxy lookup when an applicable template uses `${lookup.srv}`
    pub lookup_on_demand: bool,

    /// Headers injected only on the first request of a dialog (CSeq 1)
    pub dialog_initial_headers: Vec<String>,

    /// Headers that always replace existing values
    pub always_replace_headers: Vec<String>,

    /// Include resolved header values in log output
    pub log_applied_values: bool,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        InjectorConfig {
            lookup_timeout_ms: 2000,
            srv_service: "_sip._udp".to_string(),
            lookup_on_demand: false,
            dialog_initial_headers: vec!["Route".to_string(), "P-Asserted-Identity".to_string()],
            always_replace_headers: vec!["Route".to_string()],
            log_applied_values: true,
        }
    }
}

impl InjectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn with_srv_service(mut self, service: impl Into<String>) -> Self {
        self.srv_service = service.into();
        self
    }

    pub fn with_lookup_on_demand(mut self, on_demand: bool) -> Self {
        self.lookup_on_demand = on_demand;
        self
    }

    pub fn with_dialog_initial_headers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dialog_initial_headers = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_always_replace_headers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.always_replace_headers = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn without_value_logging(mut self) -> Self {
        self.log_applied_values = false;
        self
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Parsed [`Self::dialog_initial_headers`]
    pub fn dialog_initial_header_names(&self) -> InjectResult<Vec<HeaderName>> {
        parse_names(&self.dialog_initial_headers)
    }

    /// Parsed [`Self::always_replace_headers`]
    pub fn always_replace_header_names(&self) -> InjectResult<Vec<HeaderName>> {
        parse_names(&self.always_replace_headers)
    }

    /// Checks the configuration for values the injector cannot work with
    pub fn validate(&self) -> InjectResult<()> {
        if self.lookup_timeout_ms == 0 {
            return Err(InjectError::config("lookup_timeout_ms must be greater than zero"));
        }
        if !self.srv_service.starts_with('_') || self.srv_service.ends_with('.') {
            return Err(InjectError::config(format!(
                "srv_service must look like _service._proto, got {:?}",
                self.srv_service
            )));
        }
        self.dialog_initial_header_names()?;
        self.always_replace_header_names()?;
        Ok(())
    }

    /// Parses and validates a TOML document
    pub fn from_toml_str(s: &str) -> InjectResult<Self> {
        let config: InjectorConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> InjectResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

fn parse_names(names: &[String]) -> InjectResult<Vec<HeaderName>> {
    names
        .iter()
        .map(|n| {
            HeaderName::from_str(n)
                .map_err(|e| InjectError::config(format!("invalid header name {:?}: {}", n, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InjectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lookup_timeout(), Duration::from_secs(2));
        assert_eq!(
            config.dialog_initial_header_names().unwrap(),
            vec![HeaderName::Route, HeaderName::PAssertedIdentity]
        );
        assert_eq!(config.always_replace_header_names().unwrap(), vec![HeaderName::Route]);
    }

    #[test]
    fn test_validation_failures() {
        let zero = InjectorConfig::new().with_lookup_timeout(Duration::ZERO);
        assert!(matches!(zero.validate(), Err(InjectError::Configuration { .. })));

        let bad_service = InjectorConfig::new().with_srv_service("sip.udp");
        assert!(bad_service.validate().is_err());

        let bad_name = InjectorConfig::new().with_always_replace_headers(["Route", "Not A Header"]);
        assert!(bad_name.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = InjectorConfig::from_toml_str(
            r#"
            srv_service = "_sip._tcp"
            dialog_initial_headers = ["Route"]
            log_applied_values = false
            "#,
        )
        .unwrap();
        assert_eq!(config.srv_service, "_sip._tcp");
        assert_eq!(config.dialog_initial_headers, vec!["Route"]);
        assert!(!config.log_applied_values);
        assert_eq!(config.lookup_timeout_ms, 2000);

        assert!(matches!(
            InjectorConfig::from_toml_str("lookup_timeout_ms = \"soon\""),
            Err(InjectError::ConfigFormat(_))
        ));
        assert!(InjectorConfig::from_toml_str("lookup_timeout_ms = 0").is_err());
    }

    #[test]
    fn test_from_missing_file() {
        let err = InjectorConfig::from_file("/nonexistent/config-headers.toml").unwrap_err();
        assert!(matches!(err, InjectError::Io(_)));
    }
}
