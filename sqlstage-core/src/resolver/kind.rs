//! Connection kinds and authentication paths.

use serde::{Deserialize, Serialize};

/// The kind of database connection being described.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// SQL Server reached by host and database alone
    PlainSqlServer,
    /// SQL Server reached through a named instance (`host\instance`)
    NamedInstanceSqlServer,
    /// Oracle reached by host, port and service name
    Oracle,
}

impl ConnectionKind {
    /// Returns true for both SQL Server kinds.
    pub const fn is_sql_server(self) -> bool {
        matches!(self, Self::PlainSqlServer | Self::NamedInstanceSqlServer)
    }
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlainSqlServer => write!(f, "SQL Server"),
            Self::NamedInstanceSqlServer => write!(f, "SQL Server (named instance)"),
            Self::Oracle => write!(f, "Oracle"),
        }
    }
}

/// Authentication path for the SQL Server kinds.
///
/// Choosing between the two is a policy decision made by the caller. Oracle
/// connections always carry their own credentials and ignore this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Connect as the calling process's platform identity
    #[default]
    Integrated,
    /// Connect with explicit `domain\user` and password
    Domain,
}

impl AuthMode {
    /// Maps the `useDomainAuth` flag onto an auth mode.
    pub const fn from_domain_flag(use_domain_auth: bool) -> Self {
        if use_domain_auth {
            Self::Domain
        } else {
            Self::Integrated
        }
    }
}
