//! Resolved connection descriptors.

use super::{AuthMode, ConnectionKind};
use crate::security::{Credentials, REDACTED};
use zeroize::Zeroizing;

/// Where a connection points, without any credential material.
///
/// Every string is the caller-supplied value, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Server host name
    pub host: String,
    /// Named SQL Server instance
    pub instance: Option<String>,
    /// SQL Server database
    pub database: Option<String>,
    /// Oracle listener port
    pub port: Option<String>,
    /// Oracle service name or SID
    pub service: Option<String>,
}

impl Endpoint {
    /// Parses the port as a TCP port number, if it is one.
    pub fn port_number(&self) -> Option<u16> {
        self.port.as_deref().and_then(|p| p.parse().ok())
    }
}

/// A fully-resolved connection, ready for an engine factory.
///
/// Only the resolver constructs descriptors, and only from a complete field
/// set, so every descriptor is usable as-is.
///
/// # Security
/// The full address embeds the password. `Debug` and `Display` render the
/// redacted address; [`ConnectionDescriptor::address`] is for engine
/// construction only.
#[derive(Clone)]
pub struct ConnectionDescriptor {
    kind: ConnectionKind,
    auth: Option<AuthMode>,
    driver: String,
    endpoint: Endpoint,
    credentials: Option<Credentials>,
    address: Zeroizing<String>,
}

impl ConnectionDescriptor {
    pub(super) fn new(
        kind: ConnectionKind,
        auth: Option<AuthMode>,
        driver: &str,
        endpoint: Endpoint,
        credentials: Option<Credentials>,
    ) -> Self {
        let address = Zeroizing::new(render_address(
            kind,
            driver,
            &endpoint,
            credentials.as_ref(),
            false,
        ));
        Self {
            kind,
            auth,
            driver: driver.to_string(),
            endpoint,
            credentials,
            address,
        }
    }

    /// The connection kind.
    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    /// The SQL Server auth path; `None` for Oracle.
    pub fn auth(&self) -> Option<AuthMode> {
        self.auth
    }

    /// The caller-supplied driver identifier.
    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Host, instance, database, port and service.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Credentials for the domain and Oracle paths.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The full address, including any password. Never log this.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The address with the password replaced by `***`.
    pub fn redacted_address(&self) -> String {
        render_address(
            self.kind,
            &self.driver,
            &self.endpoint,
            self.credentials.as_ref(),
            true,
        )
    }
}

fn render_address(
    kind: ConnectionKind,
    driver: &str,
    endpoint: &Endpoint,
    credentials: Option<&Credentials>,
    redact: bool,
) -> String {
    let password = |creds: &Credentials| -> String {
        if redact {
            REDACTED.to_string()
        } else {
            creds.password().to_string()
        }
    };

    let mut address = format!("{}://", driver);
    match kind {
        ConnectionKind::PlainSqlServer | ConnectionKind::NamedInstanceSqlServer => {
            if let Some(creds) = credentials {
                address.push_str(&format!(
                    "{}:{}@",
                    creds.qualified_username(),
                    password(creds)
                ));
            }
            address.push_str(&endpoint.host);
            if let Some(instance) = &endpoint.instance {
                address.push('\\');
                address.push_str(instance);
            }
            address.push('/');
            address.push_str(endpoint.database.as_deref().unwrap_or_default());
        }
        ConnectionKind::Oracle => {
            if let Some(creds) = credentials {
                address.push_str(&format!("{}:{}@", creds.username(), password(creds)));
            }
            address.push_str(&format!(
                "{}:{}/?service_name={}",
                endpoint.host,
                endpoint.port.as_deref().unwrap_or_default(),
                endpoint.service.as_deref().unwrap_or_default()
            ));
        }
    }
    address
}

impl PartialEq for ConnectionDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.auth == other.auth
            && self.driver == other.driver
            && self.endpoint == other.endpoint
            && self.address == other.address
    }
}

impl Eq for ConnectionDescriptor {}

impl std::fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.redacted_address())
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("kind", &self.kind)
            .field("auth", &self.auth)
            .field("address", &self.redacted_address())
            .finish()
    }
}
