//! Collaborator traits for engines, host resolution and diagnostics.
//!
//! The resolver only produces descriptors. Everything that touches the
//! network sits behind the traits in this module so that callers can swap
//! drivers and tests can substitute in-memory fakes.
//!
//! # Module Structure
//! - `host`: DNS-backed [`HostResolver`]
//! - `mssql`: SQL Server engine built on tiberius (feature `mssql`)

use crate::config::EngineOptions;
use crate::models::{IfExists, TableRef, TabularData};
use crate::resolver::ConnectionDescriptor;
use crate::{Result, SqlStageError};
use async_trait::async_trait;

mod host;
#[cfg(feature = "mssql")]
pub mod mssql;

pub use host::SystemHostResolver;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Detail useful when tracing a run
    Debug,
    /// Progress messages
    Info,
    /// A unit of work was skipped
    Warning,
    /// Configuration is unusable
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Receives severity-tagged diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Records one diagnostic message.
    fn emit(&self, severity: Severity, message: &str);
}

/// Checks whether a host name resolves.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Returns true if the host resolves to at least one address.
    async fn resolve_host(&self, host: &str) -> bool;
}

/// An open connection engine.
///
/// # Security
/// Implementations must not include addresses or credentials in the errors
/// they return.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Runs a query and returns its first result set.
    ///
    /// # Errors
    /// Returns error if the connection or the query fails
    async fn query(&self, sql: &str) -> Result<TabularData>;

    /// Reads every row of a table.
    ///
    /// # Errors
    /// Returns error if the connection or the read fails
    async fn fetch_table(&self, table: &TableRef) -> Result<TabularData>;

    /// Inserts rows into an existing table and returns how many were written.
    ///
    /// # Errors
    /// Returns error if the connection or any insert fails
    async fn append(&self, data: &TabularData, table: &TableRef, if_exists: IfExists)
    -> Result<u64>;

    /// Executes a statement and returns the number of affected rows.
    ///
    /// # Errors
    /// Returns error if the connection or the statement fails
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Releases any held clients. The engine stays usable afterwards.
    async fn dispose(&self) {}
}

/// Builds engines from resolved descriptors.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    /// Creates an engine for the descriptor.
    ///
    /// # Errors
    /// Returns error if the descriptor's kind is unsupported or the options
    /// are invalid
    async fn create(
        &self,
        descriptor: &ConnectionDescriptor,
        options: &EngineOptions,
    ) -> Result<Box<dyn Engine>>;
}

/// Factory for the drivers compiled into this build.
///
/// SQL Server descriptors use the tiberius engine when the `mssql` feature
/// is enabled. No Oracle driver is bundled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEngineFactory;

#[async_trait]
impl EngineFactory for DefaultEngineFactory {
    async fn create(
        &self,
        descriptor: &ConnectionDescriptor,
        options: &EngineOptions,
    ) -> Result<Box<dyn Engine>> {
        options.validate()?;

        match descriptor.kind() {
            #[cfg(feature = "mssql")]
            kind if kind.is_sql_server() => {
                let engine = mssql::SqlServerEngine::new(descriptor, options)?;
                Ok(Box::new(engine))
            }
            #[cfg(not(feature = "mssql"))]
            kind if kind.is_sql_server() => Err(SqlStageError::unsupported_feature(
                "Engine (compile with --features mssql)",
                kind.to_string(),
            )),
            kind => Err(SqlStageError::unsupported_feature(
                "Engine (no bundled driver)",
                kind.to_string(),
            )),
        }
    }
}
