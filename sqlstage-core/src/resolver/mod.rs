//! Connection descriptor resolution.
//!
//! [`resolve`] turns a connection kind and a bag of caller-assembled fields
//! into either a [`ConnectionDescriptor`] or the complete set of fields that
//! are missing. It is a pure function: no I/O, no environment reads, no
//! logging. Callers report `Incomplete` results through their diagnostic sink.
//!
//! # Example
//! ```rust
//! use sqlstage_core::resolver::{
//!     resolve, AuthMode, ConnectionFields, ConnectionKind, FieldName, ResolutionResult,
//! };
//!
//! let fields = ConnectionFields::new()
//!     .with(FieldName::Host, "avroce.ec2.dl")
//!     .with(FieldName::Database, "SALES_DB");
//!
//! match resolve(ConnectionKind::PlainSqlServer, AuthMode::Integrated, "mssql", &fields) {
//!     ResolutionResult::Resolved(descriptor) => {
//!         assert_eq!(descriptor.address(), "mssql://avroce.ec2.dl/SALES_DB");
//!     }
//!     ResolutionResult::Incomplete(missing) => panic!("missing {}", missing),
//! }
//! ```

mod descriptor;
mod fields;
mod kind;

pub use descriptor::{ConnectionDescriptor, Endpoint};
pub use fields::{ConnectionFields, FieldName, FieldValue};
pub use kind::{AuthMode, ConnectionKind};

use crate::security::Credentials;
use std::collections::BTreeSet;

/// The set of required fields that were absent or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingFields(BTreeSet<FieldName>);

impl MissingFields {
    /// Number of missing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is missing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a specific field is missing.
    pub fn contains(&self, name: FieldName) -> bool {
        self.0.contains(&name)
    }

    /// Missing fields in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<FieldName> for MissingFields {
    fn from_iter<I: IntoIterator<Item = FieldName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for MissingFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().map(FieldName::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    /// Every required field was present
    Resolved(ConnectionDescriptor),
    /// The complete set of required fields that were missing
    Incomplete(MissingFields),
}

impl ResolutionResult {
    /// Converts into a `Result`, tagging an incomplete outcome with its kind.
    ///
    /// # Errors
    /// Returns `ConfigurationIncomplete` carrying the missing fields.
    pub fn into_result(self, kind: ConnectionKind) -> crate::Result<ConnectionDescriptor> {
        match self {
            Self::Resolved(descriptor) => Ok(descriptor),
            Self::Incomplete(missing) => {
                Err(crate::SqlStageError::ConfigurationIncomplete { kind, missing })
            }
        }
    }
}

/// Returns the required fields for a kind and auth path, in canonical order.
pub fn required_fields(kind: ConnectionKind, auth: AuthMode) -> Vec<FieldName> {
    let mut required = match kind {
        ConnectionKind::Oracle => {
            return vec![
                FieldName::Host,
                FieldName::User,
                FieldName::Password,
                FieldName::ServiceOrSid,
                FieldName::Port,
            ];
        }
        ConnectionKind::PlainSqlServer => vec![FieldName::Host, FieldName::Database],
        ConnectionKind::NamedInstanceSqlServer => {
            vec![FieldName::Host, FieldName::Database, FieldName::Instance]
        }
    };
    if auth == AuthMode::Domain {
        required.extend([
            FieldName::Domain,
            FieldName::DomainUser,
            FieldName::DomainPassword,
        ]);
    }
    required.sort();
    required
}

/// Reads required fields while recording every one that is missing.
struct FieldReader<'a> {
    fields: &'a ConnectionFields,
    missing: BTreeSet<FieldName>,
}

impl<'a> FieldReader<'a> {
    fn new(fields: &'a ConnectionFields) -> Self {
        Self {
            fields,
            missing: BTreeSet::new(),
        }
    }

    fn take(&mut self, name: FieldName) -> String {
        match self.fields.present(name) {
            Some(value) => value.to_string(),
            None => {
                self.missing.insert(name);
                String::new()
            }
        }
    }
}

/// Resolves a connection kind and its fields into a descriptor or a diagnostic.
///
/// `auth` selects the SQL Server auth path and is ignored for Oracle.
/// `driver` is the scheme placed at the front of the address and is not
/// interpreted. Field values are substituted verbatim.
pub fn resolve(
    kind: ConnectionKind,
    auth: AuthMode,
    driver: &str,
    fields: &ConnectionFields,
) -> ResolutionResult {
    let mut reader = FieldReader::new(fields);

    let (endpoint, credentials, auth) = match kind {
        ConnectionKind::Oracle => {
            let host = reader.take(FieldName::Host);
            let user = reader.take(FieldName::User);
            let password = reader.take(FieldName::Password);
            let service = reader.take(FieldName::ServiceOrSid);
            let port = reader.take(FieldName::Port);
            let endpoint = Endpoint {
                host,
                instance: None,
                database: None,
                port: Some(port),
                service: Some(service),
            };
            (endpoint, Some(Credentials::new(user, password)), None)
        }
        ConnectionKind::PlainSqlServer | ConnectionKind::NamedInstanceSqlServer => {
            let host = reader.take(FieldName::Host);
            let database = reader.take(FieldName::Database);
            let instance = (kind == ConnectionKind::NamedInstanceSqlServer)
                .then(|| reader.take(FieldName::Instance));
            let credentials = (auth == AuthMode::Domain).then(|| {
                let domain = reader.take(FieldName::Domain);
                let user = reader.take(FieldName::DomainUser);
                let password = reader.take(FieldName::DomainPassword);
                Credentials::domain(domain, user, password)
            });
            let endpoint = Endpoint {
                host,
                instance,
                database: Some(database),
                port: None,
                service: None,
            };
            (endpoint, credentials, Some(auth))
        }
    };

    if !reader.missing.is_empty() {
        return ResolutionResult::Incomplete(MissingFields(reader.missing));
    }

    ResolutionResult::Resolved(ConnectionDescriptor::new(
        kind,
        auth,
        driver,
        endpoint,
        credentials,
    ))
}
