//! Account properties and the per-pass working snapshot
//!
//! [`AccountProperties`] is the flat key/value mapping the protocol provider
//! stores for an account. The injector never writes to it; values it derives
//! while processing a request live in a [`PropertySnapshot`] that exists for
//! the duration of one pass only, keyed by [`DerivedKey`] so they can never
//! shadow configuration.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Prefix of the custom header properties (`ConfigHeader.<index>.<field>`)
pub const CONFIG_HEADER_PREFIX: &str = "ConfigHeader";

/// Address used to discover the outbound proxy, e.g. `ims.example.net`
pub const ACCOUNT_ADDRESS: &str = "ACCOUNT_ADDRESS";

/// Unique account identifier, `user@host`
pub const ACCOUNT_UID: &str = "ACCOUNT_UID";

/// Configured SIP domain
pub const DOMAIN: &str = "DOMAIN";

/// Configured user id, possibly `user@host`
pub const USER_ID: &str = "USER_ID";

/// When true, `+` characters are stripped from resolved header values
pub const PLUS_DISABLED: &str = "PLUS_DISABLED";

/// Flat account configuration
///
/// # Examples
///
/// ```rust
/// use rvoip_config_headers::properties::{AccountProperties, DOMAIN, PLUS_DISABLED};
///
/// let props: AccountProperties = [
///     (DOMAIN, "example.com"),
///     (PLUS_DISABLED, "TRUE"),
///     ("ConfigHeader.1.Name", "X-Account"),
/// ]
/// .into_iter()
/// .collect();
///
/// assert_eq!(props.get(DOMAIN), Some("example.com"));
/// assert!(props.get_bool(PLUS_DISABLED));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountProperties {
    entries: BTreeMap<String, String>,
}

impl AccountProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a property
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a property
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Boolean property, `true` only for exactly `"true"` in any case
    ///
    /// Surrounding whitespace is not ignored, so `" true"` reads as false.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AccountProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        AccountProperties {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl From<HashMap<String, String>> for AccountProperties {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

/// Values derived while processing a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DerivedKey {
    /// Host part of the To URI, between `@` and the first `;`
    DomainName,
    /// Proxy address returned by the server lookup
    LookupServer,
}

impl DerivedKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivedKey::DomainName => "DomainName",
            DerivedKey::LookupServer => "LookupServer",
        }
    }
}

/// Read-only account view plus the values derived during one pass
#[derive(Debug, Clone)]
pub struct PropertySnapshot<'a> {
    account: &'a AccountProperties,
    derived: BTreeMap<DerivedKey, String>,
}

impl<'a> PropertySnapshot<'a> {
    pub fn new(account: &'a AccountProperties) -> Self {
        PropertySnapshot {
            account,
            derived: BTreeMap::new(),
        }
    }

    /// Account property, ignoring blank values
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.account.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.account.get_bool(key)
    }

    pub fn derived(&self, key: DerivedKey) -> Option<&str> {
        self.derived.get(&key).map(String::as_str)
    }

    pub fn set_derived(&mut self, key: DerivedKey, value: impl Into<String>) {
        self.derived.insert(key, value.into());
    }
}
