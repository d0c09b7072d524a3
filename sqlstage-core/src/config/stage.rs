//! Job configuration files and connection field assembly.
//!
//! A configuration file names the connections a job may use. Field values are
//! literals, references to environment variables, or entries in the OS
//! credential store, so secrets can stay out of the file:
//!
//! ```json
//! {
//!   "engine": { "pool_size": 5, "pool_timeout": 5 },
//!   "connections": {
//!     "warehouse": {
//!       "kind": "plain_sql_server",
//!       "auth": "platform",
//!       "fields": {
//!         "host": "avroce.ec2.dl",
//!         "database": "SALES_DB",
//!         "domain": { "env": "DOMAIN_NAME" },
//!         "domain_user": { "env": "DOMAIN_USR" },
//!         "domain_password": { "env": "DOMAIN_PWD" }
//!       }
//!     },
//!     "store": {
//!       "kind": "oracle",
//!       "fields": {
//!         "host": "XS01avroce_ora",
//!         "user": "store_user",
//!         "password": { "service": "fakeora", "user": "pwd" },
//!         "service_or_sid": "store_db",
//!         "port": 6666
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Assembly happens here, outside the resolver, so that resolution itself
//! never reads the environment or the credential store.
//!
//! # Security
//! `Debug` output of [`ConnectionSpec`] and [`StageConfig`] masks literal
//! passwords.

use super::EngineOptions;
use crate::resolver::{AuthMode, ConnectionFields, ConnectionKind, FieldName, FieldValue};
use crate::security::secret_store_lookup;
use crate::{Result, SqlStageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// How the SQL Server auth path is chosen for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthSetting {
    /// Always use integrated auth
    Integrated,
    /// Always use domain credentials
    Domain,
    /// Integrated on Windows, domain credentials elsewhere
    #[default]
    Platform,
}

impl AuthSetting {
    /// Decides the auth mode for the current platform.
    pub const fn auth_mode(self) -> AuthMode {
        match self {
            Self::Integrated => AuthMode::Integrated,
            Self::Domain => AuthMode::Domain,
            Self::Platform => AuthMode::from_domain_flag(!cfg!(windows)),
        }
    }
}

/// Where a field value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSource {
    /// Read from an environment variable at assembly time
    Env {
        /// Variable name
        env: String,
    },
    /// Read from the OS credential store at assembly time
    SecretStore {
        /// Service the entry was saved under
        service: String,
        /// User the entry was saved under
        user: String,
    },
    /// Taken verbatim from the file
    Literal(FieldValue),
}

/// Driver identifiers placed at the front of resolved addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverNames {
    /// Driver for both SQL Server kinds
    pub sql_server: String,
    /// Driver for Oracle
    pub oracle: String,
}

impl Default for DriverNames {
    fn default() -> Self {
        Self {
            sql_server: "mssql".to_string(),
            oracle: "oracle".to_string(),
        }
    }
}

impl DriverNames {
    /// The driver for a connection kind.
    pub fn for_kind(&self, kind: ConnectionKind) -> &str {
        if kind.is_sql_server() {
            &self.sql_server
        } else {
            &self.oracle
        }
    }
}

/// One named connection in a configuration file.
///
/// # Security
/// `Debug` output masks literal passwords. Environment and credential store
/// references are shown since they hold no secret themselves.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    /// Which address template applies
    pub kind: ConnectionKind,
    /// SQL Server auth path; ignored for Oracle
    #[serde(default)]
    pub auth: AuthSetting,
    /// Overrides the configured driver name for this connection
    #[serde(default)]
    pub driver: Option<String>,
    /// Where each field's value comes from
    #[serde(default)]
    pub fields: BTreeMap<FieldName, FieldSource>,
}

/// Field sources with literal secrets masked.
struct MaskedSources<'a>(&'a BTreeMap<FieldName, FieldSource>);

impl fmt::Debug for MaskedSources<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, source) in self.0 {
            match source {
                FieldSource::Literal(value) if name.is_secret() && !value.is_empty() => {
                    map.entry(&name.as_str(), &"****");
                }
                _ => {
                    map.entry(&name.as_str(), source);
                }
            }
        }
        map.finish()
    }
}

impl fmt::Debug for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSpec")
            .field("kind", &self.kind)
            .field("auth", &self.auth)
            .field("driver", &self.driver)
            .field("fields", &MaskedSources(&self.fields))
            .finish()
    }
}

/// Everything needed to resolve and open one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// Connection name from the configuration file
    pub name: String,
    /// Which address template applies
    pub kind: ConnectionKind,
    /// SQL Server auth path, already decided for this platform
    pub auth: AuthMode,
    /// Driver identifier for the address
    pub driver: String,
    /// Assembled field values
    pub fields: ConnectionFields,
}

impl ConnectionRequest {
    /// Builds a request directly from already-assembled fields.
    pub fn new(
        name: impl Into<String>,
        kind: ConnectionKind,
        auth: AuthMode,
        driver: impl Into<String>,
        fields: ConnectionFields,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            auth,
            driver: driver.into(),
            fields,
        }
    }
}

/// A parsed job configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Options for every engine created by this job
    #[serde(default)]
    pub engine: EngineOptions,
    /// Default driver identifiers
    #[serde(default)]
    pub drivers: DriverNames,
    /// Named connections, sorted by name
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionSpec>,
}

impl StageConfig {
    /// Parses and validates a configuration from JSON text.
    ///
    /// # Errors
    /// Returns a serialization error for malformed JSON or unknown field
    /// names, and a configuration error for invalid engine options.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|source| SqlStageError::Serialization {
                context: "Failed to parse stage configuration".to_string(),
                source,
            })?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read, otherwise as
    /// [`StageConfig::from_json`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SqlStageError::io(format!("Failed to read {}", path.display()), e)
        })?;
        Self::from_json(&json)
    }

    /// Assembles a connection request, reading references from the process
    /// environment and the OS credential store.
    ///
    /// # Errors
    /// Returns a configuration error if no connection has this name.
    pub fn request(&self, name: &str) -> Result<ConnectionRequest> {
        self.request_with(name, |var| std::env::var(var).ok(), secret_store_lookup)
    }

    /// Assembles a connection request with explicit lookups for environment
    /// variables and credential store entries.
    ///
    /// Unset variables and missing entries leave the field absent so the
    /// resolver reports it.
    ///
    /// # Errors
    /// Returns a configuration error if no connection has this name.
    pub fn request_with<E, S>(&self, name: &str, env: E, secrets: S) -> Result<ConnectionRequest>
    where
        E: Fn(&str) -> Option<String>,
        S: Fn(&str, &str) -> Option<String>,
    {
        let spec = self.connections.get(name).ok_or_else(|| {
            SqlStageError::configuration(format!("No connection named '{}' in configuration", name))
        })?;

        let mut fields = ConnectionFields::new();
        for (field, source) in &spec.fields {
            match source {
                FieldSource::Literal(value) => fields.set(*field, value.clone()),
                FieldSource::Env { env: var } => match env(var) {
                    Some(value) => fields.set(*field, value),
                    None => debug!("{} is not set; leaving '{}' of '{}' empty", var, field, name),
                },
                FieldSource::SecretStore { service, user } => match secrets(service, user) {
                    Some(value) => fields.set(*field, value),
                    None => debug!(
                        "No secret for '{}'/'{}'; leaving '{}' of '{}' empty",
                        service, user, field, name
                    ),
                },
            }
        }

        let driver = spec
            .driver
            .clone()
            .unwrap_or_else(|| self.drivers.for_kind(spec.kind).to_string());

        Ok(ConnectionRequest {
            name: name.to_string(),
            kind: spec.kind,
            auth: spec.auth.auth_mode(),
            driver,
            fields,
        })
    }

    /// Connection names in sorted order.
    pub fn connection_names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "connections": {
            "warehouse": {
                "kind": "plain_sql_server",
                "auth": "domain",
                "fields": {
                    "host": "avroce.ec2.dl",
                    "database": "SALES_DB",
                    "domain": { "env": "DOMAIN_NAME" },
                    "domain_user": { "env": "DOMAIN_USR" },
                    "domain_password": { "env": "DOMAIN_PWD" }
                }
            },
            "store": {
                "kind": "oracle",
                "driver": "oracle+cx_oracle",
                "fields": { "host": "XS01avroce_ora", "port": 6666 }
            }
        }
    }"#;

    fn no_secrets(_: &str, _: &str) -> Option<String> {
        None
    }

    const SECRET_STORE_CONFIG: &str = r#"{
        "connections": {
            "store": {
                "kind": "oracle",
                "fields": {
                    "host": "XS01avroce_ora",
                    "user": "store_user",
                    "password": { "service": "fakeora", "user": "pwd" },
                    "service_or_sid": "store_db",
                    "port": 6666
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_and_assemble_with_lookup() {
        let config = StageConfig::from_json(CONFIG).unwrap();
        let request = config
            .request_with(
                "warehouse",
                |var| match var {
                    "DOMAIN_NAME" => Some("CORP".to_string()),
                    "DOMAIN_USR" => Some("etl".to_string()),
                    _ => None,
                },
                no_secrets,
            )
            .unwrap();

        assert_eq!(request.kind, ConnectionKind::PlainSqlServer);
        assert_eq!(request.auth, AuthMode::Domain);
        assert_eq!(request.driver, "mssql");
        assert!(request.fields.is_present(FieldName::Domain));
        assert!(!request.fields.is_present(FieldName::DomainPassword));
    }

    #[test]
    fn test_driver_override_and_integer_literal() {
        let config = StageConfig::from_json(CONFIG).unwrap();
        let request = config.request_with("store", |_| None, no_secrets).unwrap();

        assert_eq!(request.driver, "oracle+cx_oracle");
        assert_eq!(
            request.fields.get(FieldName::Port),
            Some(&FieldValue::Integer(6666))
        );
    }

    #[test]
    fn test_unknown_connection() {
        let config = StageConfig::from_json(CONFIG).unwrap();
        assert!(config.request_with("nope", |_| None, no_secrets).is_err());
    }

    #[test]
    fn test_rejects_invalid_engine_options() {
        let result = StageConfig::from_json(r#"{"engine": {"pool_size": 0}}"#);
        assert!(matches!(result, Err(SqlStageError::Configuration { .. })));
    }

    #[test]
    fn test_rejects_unknown_field_name() {
        let result = StageConfig::from_json(
            r#"{"connections": {"x": {"kind": "oracle", "fields": {"sid": "s"}}}}"#,
        );
        assert!(matches!(result, Err(SqlStageError::Serialization { .. })));
    }

    #[test]
    fn test_platform_auth() {
        let expected = if cfg!(windows) {
            AuthMode::Integrated
        } else {
            AuthMode::Domain
        };
        assert_eq!(AuthSetting::Platform.auth_mode(), expected);
        assert_eq!(AuthSetting::default(), AuthSetting::Platform);
    }

    #[test]
    fn test_secret_store_fills_password() {
        let config = StageConfig::from_json(SECRET_STORE_CONFIG).unwrap();
        let request = config
            .request_with(
                "store",
                |_| panic!("no environment lookups expected"),
                |service, user| {
                    assert_eq!((service, user), ("fakeora", "pwd"));
                    Some("from_store".to_string())
                },
            )
            .unwrap();

        assert_eq!(
            request.fields.present(FieldName::Password),
            Some(&FieldValue::from("from_store"))
        );
    }

    #[test]
    fn test_missing_secret_store_entry_leaves_field_absent() {
        let config = StageConfig::from_json(SECRET_STORE_CONFIG).unwrap();
        let request = config.request_with("store", |_| None, no_secrets).unwrap();

        assert!(!request.fields.is_present(FieldName::Password));
        let result = crate::resolver::resolve(
            request.kind,
            request.auth,
            &request.driver,
            &request.fields,
        );
        match result {
            crate::resolver::ResolutionResult::Incomplete(missing) => {
                assert_eq!(missing.to_string(), "password");
            }
            crate::resolver::ResolutionResult::Resolved(_) => panic!("password must be missing"),
        }
    }

    #[test]
    fn test_debug_masks_literal_passwords() {
        let config = StageConfig::from_json(
            r#"{"connections": {
                "store": {"kind": "oracle", "fields": {
                    "user": "store_user", "password": "hunter2_secret"
                }},
                "warehouse": {"kind": "plain_sql_server", "auth": "domain", "fields": {
                    "domain_user": "etl", "domain_password": "also_secret",
                    "domain": { "env": "DOMAIN_NAME" }
                }}
            }}"#,
        )
        .unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2_secret"));
        assert!(!debug.contains("also_secret"));
        assert!(debug.contains("store_user"));
        assert!(debug.contains("DOMAIN_NAME"));
        assert!(debug.contains("****"));
    }
}
