//! Command implementations.
//!
//! Both commands work on [`ConnectionRequest`]s assembled from the
//! configuration file, so tests can drive them with fake engines and host
//! resolvers.

use sqlstage_core::resolver::required_fields;
use sqlstage_core::{
    ConnectionRequest, Connector, FieldName, HostResolver, IfExists, MissingFields, Result,
    SqlStageError, StageConfig, TableRef,
};
use std::fmt;
use tracing::info;

/// Assembles a connection request and optionally prompts for passwords the
/// configuration leaves absent.
///
/// # Errors
/// Returns a configuration error for an unknown connection name, or an I/O
/// error if the prompt cannot be read.
pub fn assemble_request<P>(
    config: &StageConfig,
    name: &str,
    prompt: Option<P>,
) -> Result<ConnectionRequest>
where
    P: Fn(&str) -> std::io::Result<String>,
{
    let mut request = config.request(name)?;
    if let Some(prompt) = prompt {
        fill_missing_passwords(&mut request, prompt)?;
    }
    Ok(request)
}

/// Prompts for each required password field that is absent or empty.
///
/// An empty answer leaves the field absent, so resolution still reports it.
///
/// # Errors
/// Returns an I/O error if the prompt cannot be read.
pub fn fill_missing_passwords<P>(request: &mut ConnectionRequest, prompt: P) -> Result<()>
where
    P: Fn(&str) -> std::io::Result<String>,
{
    let required = required_fields(request.kind, request.auth);
    for field in [FieldName::Password, FieldName::DomainPassword] {
        if !required.contains(&field) || request.fields.is_present(field) {
            continue;
        }

        let label = format!("Enter {} for '{}': ", field, request.name);
        let value = prompt(&label)
            .map_err(|e| SqlStageError::io(format!("Failed to read {}", field), e))?;
        if !value.is_empty() {
            request.fields.set(field, value);
        }
    }
    Ok(())
}

/// Result of checking one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Resolved; `reachable` is set when the host was probed
    Resolved {
        /// Redacted address
        address: String,
        /// Whether the host resolved, if it was probed
        reachable: Option<bool>,
    },
    /// Resolved, but this build cannot open an engine for it
    Unavailable {
        /// Redacted address
        address: String,
        /// What is unsupported
        reason: String,
    },
    /// Required fields are absent or empty
    Incomplete(MissingFields),
}

/// One line of a check report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Connection name
    pub name: String,
    /// What the check found
    pub status: CheckStatus,
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            CheckStatus::Resolved {
                address,
                reachable: None,
            } => write!(f, "✓ {}: {}", self.name, address),
            CheckStatus::Resolved {
                address,
                reachable: Some(true),
            } => write!(f, "✓ {}: {} (host resolves)", self.name, address),
            CheckStatus::Resolved {
                address,
                reachable: Some(false),
            } => write!(f, "! {}: {} (host does not resolve)", self.name, address),
            CheckStatus::Unavailable { address, reason } => write!(
                f,
                "! {}: {} (engine unavailable: {})",
                self.name, address, reason
            ),
            CheckStatus::Incomplete(missing) => {
                write!(f, "✗ {}: missing {}", self.name, missing)
            }
        }
    }
}

/// Outcome of `sqlstage check`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// One outcome per connection, in request order
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    /// True when no connection is missing fields.
    ///
    /// A connection whose engine is unavailable still counts as complete:
    /// its configuration is fine, only this build cannot use it.
    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| !matches!(o.status, CheckStatus::Incomplete(_)))
    }
}

/// Resolves each request, confirms an engine can be built for it, and
/// optionally probes host names.
///
/// Incomplete connections are reported in the result, not as errors; the
/// connector also emits a critical diagnostic for each. Engines this build
/// does not support are reported as unavailable and are not probed.
///
/// # Errors
/// Propagates errors other than incomplete configuration and unsupported
/// engines.
pub async fn check(
    connector: &Connector,
    requests: &[ConnectionRequest],
    hosts: Option<&dyn HostResolver>,
) -> Result<CheckReport> {
    let mut report = CheckReport::default();

    for request in requests {
        let status = match connector.resolve(request) {
            Ok(descriptor) => {
                let address = descriptor.redacted_address();
                match connector.ensure_engine(&descriptor).await {
                    Ok(()) => {
                        let reachable = match hosts {
                            Some(hosts) => {
                                Some(hosts.resolve_host(&descriptor.endpoint().host).await)
                            }
                            None => None,
                        };
                        CheckStatus::Resolved { address, reachable }
                    }
                    Err(SqlStageError::UnsupportedFeature {
                        feature,
                        database_type,
                    }) => CheckStatus::Unavailable {
                        address,
                        reason: format!("{} not supported for {}", feature, database_type),
                    },
                    Err(e) => return Err(e),
                }
            }
            Err(SqlStageError::ConfigurationIncomplete { missing, .. }) => {
                CheckStatus::Incomplete(missing)
            }
            Err(e) => return Err(e),
        };

        report.outcomes.push(CheckOutcome {
            name: request.name.clone(),
            status,
        });
    }

    Ok(report)
}

/// A single extract-and-append step.
#[derive(Debug, Clone)]
pub struct CopyPlan {
    /// Connection the query runs on
    pub source: ConnectionRequest,
    /// Extract query
    pub query: String,
    /// Connection holding the staging table
    pub target: ConnectionRequest,
    /// Staging table
    pub table: TableRef,
    /// Append to or replace existing rows
    pub if_exists: IfExists,
}

/// Runs a query on the source and appends the result to the target table.
///
/// Both connections are disposed before returning.
///
/// # Errors
/// Returns `ConfigurationIncomplete` if either connection is incomplete, the
/// factory's error if an engine cannot be created, and a query execution
/// error if the extract or the append was skipped. The skipped step's cause
/// has already been reported as a warning.
pub async fn copy(connector: &Connector, plan: &CopyPlan) -> Result<u64> {
    let source = connector.connect(&plan.source).await?;
    let target = connector.connect(&plan.target).await?;

    info!("Extracting from '{}'", source.name());
    let outcome = match source.query(&plan.query).await {
        None => Err(SqlStageError::query_failed(format!(
            "extract from '{}' was skipped",
            source.name()
        ))),
        Some(data) => {
            info!(
                "Extracted {} rows; appending to {} on '{}'",
                data.len(),
                plan.table,
                target.name()
            );
            target
                .push_data(&data, &plan.table, plan.if_exists)
                .await
                .ok_or_else(|| {
                    SqlStageError::query_failed(format!(
                        "append to {} on '{}' was skipped",
                        plan.table,
                        target.name()
                    ))
                })
        }
    };

    source.dispose().await;
    target.dispose().await;
    outcome
}
