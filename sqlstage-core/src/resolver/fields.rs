//! Connection field names and values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A recognised connection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    /// Server host name
    Host,
    /// SQL Server database name
    Database,
    /// SQL Server named instance
    Instance,
    /// Windows domain for domain authentication
    Domain,
    /// Domain account name
    DomainUser,
    /// Domain account password (secret)
    DomainPassword,
    /// Oracle user
    User,
    /// Oracle password (secret)
    Password,
    /// Oracle service name or SID
    ServiceOrSid,
    /// Oracle listener port
    Port,
}

impl FieldName {
    /// Every recognised field, in canonical order.
    pub const ALL: [Self; 10] = [
        Self::Host,
        Self::Database,
        Self::Instance,
        Self::Domain,
        Self::DomainUser,
        Self::DomainPassword,
        Self::User,
        Self::Password,
        Self::ServiceOrSid,
        Self::Port,
    ];

    /// The field's configuration key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Database => "database",
            Self::Instance => "instance",
            Self::Domain => "domain",
            Self::DomainUser => "domain_user",
            Self::DomainPassword => "domain_password",
            Self::User => "user",
            Self::Password => "password",
            Self::ServiceOrSid => "service_or_sid",
            Self::Port => "port",
        }
    }

    /// Whether the field holds a secret that must never be logged.
    pub const fn is_secret(self) -> bool {
        matches!(self, Self::Password | Self::DomainPassword)
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown connection field '{}'", s))
    }
}

/// A connection field value: text or an integer (ports).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text value; empty text counts as missing
    Text(String),
    /// Integer value, used for ports
    Integer(i64),
}

impl FieldValue {
    /// Empty text counts as missing; integers are always present.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl std::fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "Text({:?})", s),
            Self::Integer(i) => write!(f, "Integer({})", i),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u16> for FieldValue {
    fn from(value: u16) -> Self {
        Self::Integer(i64::from(value))
    }
}

/// The bag of connection fields assembled by the caller for one attempt.
///
/// # Security
/// `Debug` output masks secret fields.
///
/// # Example
/// ```rust
/// use sqlstage_core::resolver::{ConnectionFields, FieldName};
///
/// let fields = ConnectionFields::new()
///     .with(FieldName::Host, "avroce.ec2.dl")
///     .with(FieldName::Database, "SALES_DB");
///
/// assert!(fields.is_present(FieldName::Host));
/// assert!(!fields.is_present(FieldName::Instance));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionFields {
    values: BTreeMap<FieldName, FieldValue>,
}

impl ConnectionFields {
    /// Creates an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set a field.
    pub fn with(mut self, name: FieldName, value: impl Into<FieldValue>) -> Self {
        self.values.insert(name, value.into());
        self
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, name: FieldName, value: impl Into<FieldValue>) {
        self.values.insert(name, value.into());
    }

    /// Removes a field.
    pub fn remove(&mut self, name: FieldName) -> Option<FieldValue> {
        self.values.remove(&name)
    }

    /// Returns the raw value of a field, empty or not.
    pub fn get(&self, name: FieldName) -> Option<&FieldValue> {
        self.values.get(&name)
    }

    /// Returns the field only when it is present and non-empty.
    pub fn present(&self, name: FieldName) -> Option<&FieldValue> {
        self.values.get(&name).filter(|value| !value.is_empty())
    }

    /// Whether the field is present and non-empty.
    pub fn is_present(&self, name: FieldName) -> bool {
        self.present(name).is_some()
    }

    /// Iterates over all set fields in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &FieldValue)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }
}

impl FromIterator<(FieldName, FieldValue)> for ConnectionFields {
    fn from_iter<I: IntoIterator<Item = (FieldName, FieldValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for ConnectionFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in self.iter() {
            if name.is_secret() && !value.is_empty() {
                map.entry(&name.as_str(), &"****");
            } else {
                map.entry(&name.as_str(), value);
            }
        }
        map.finish()
    }
}
