//! Custom header specifications parsed from account properties
//!
//! Each custom header is described by up to three properties sharing an
//! index:
//!
//! ```text
//! ConfigHeader.<index>.Name   = P-Preferred-Identity
//! ConfigHeader.<index>.Value  = <sip:${from.userID}@${domain}>
//! ConfigHeader.<index>.Method = INVITE            (optional)
//! ```
//!
//! Indices are opaque strings. Keys that do not follow this shape and blank
//! values are ignored; a spec missing its name or value is kept in the set
//! but is not actionable.

use std::collections::BTreeMap;

use rvoip_sip_message::Method;
use tracing::debug;

use crate::properties::{AccountProperties, CONFIG_HEADER_PREFIX};

/// Field part of a `ConfigHeader.<index>.<field>` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecField {
    Name,
    Value,
    Method,
}

impl SpecField {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "Name" => Some(SpecField::Name),
            "Value" => Some(SpecField::Value),
            "Method" => Some(SpecField::Method),
            _ => None,
        }
    }
}

/// One configured custom header
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderSpec {
    pub index: String,
    pub name: Option<String>,
    pub value_template: Option<String>,
    /// Restricts the header to requests of this method (case-insensitive)
    pub method: Option<String>,
}

impl HeaderSpec {
    pub fn new(index: impl Into<String>) -> Self {
        HeaderSpec {
            index: index.into(),
            ..Default::default()
        }
    }

    /// Both name and value template are present
    pub fn is_actionable(&self) -> bool {
        self.name.is_some() && self.value_template.is_some()
    }

    /// Returns `(name, value_template)` when the spec is actionable
    pub fn parts(&self) -> Option<(&str, &str)> {
        Some((self.name.as_deref()?, self.value_template.as_deref()?))
    }

    /// True if the method filter is absent or matches `method`
    pub fn applies_to(&self, method: &Method) -> bool {
        self.method
            .as_deref()
            .map_or(true, |m| method.matches_ignore_case(m))
    }

    fn set(&mut self, field: SpecField, value: String) {
        match field {
            SpecField::Name => self.name = Some(value),
            SpecField::Value => self.value_template = Some(value),
            SpecField::Method => self.method = Some(value),
        }
    }
}

/// All header specs configured for an account, ordered by index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSpecSet {
    specs: BTreeMap<String, HeaderSpec>,
}

impl HeaderSpecSet {
    /// Groups the `ConfigHeader.*` properties by index
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rvoip_config_headers::{AccountProperties, HeaderSpecSet};
    ///
    /// let props = AccountProperties::new()
    ///     .with("ConfigHeader.2.Value", "${from.address}")
    ///     .with("ConfigHeader.1.Name", "X-One")
    ///     .with("ConfigHeader.2.Name", " X-Two ")
    ///     .with("ConfigHeader.1.Method", "INVITE")
    ///     .with("Unrelated", "ignored");
    ///
    /// let specs = HeaderSpecSet::parse(&props);
    /// let indices: Vec<_> = specs.iter().map(|s| s.index.as_str()).collect();
    /// assert_eq!(indices, vec!["1", "2"]);
    /// assert!(!specs.get("1").unwrap().is_actionable());
    /// assert_eq!(specs.get("2").unwrap().parts(), Some(("X-Two", "${from.address}")));
    /// ```
    pub fn parse(properties: &AccountProperties) -> Self {
        let mut specs: BTreeMap<String, HeaderSpec> = BTreeMap::new();

        for (key, value) in properties.iter() {
            let Some(rest) = key
                .strip_prefix(CONFIG_HEADER_PREFIX)
                .and_then(|k| k.strip_prefix('.'))
            else {
                continue;
            };

            let Some((index, field)) = rest.rsplit_once('.') else {
                debug!("Ignoring custom header property without index: {}", key);
                continue;
            };

            let index = index.trim();
            let Some(field) = SpecField::parse(field.trim()) else {
                debug!("Ignoring unknown custom header field: {}", key);
                continue;
            };

            let value = value.trim();
            if index.is_empty() || value.is_empty() {
                continue;
            }

            specs
                .entry(index.to_string())
                .or_insert_with(|| HeaderSpec::new(index))
                .set(field, value.to_string());
        }

        HeaderSpecSet { specs }
    }

    pub fn get(&self, index: &str) -> Option<&HeaderSpec> {
        self.specs.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
