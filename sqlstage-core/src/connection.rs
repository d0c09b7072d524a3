//! Connection setup and guarded database operations.
//!
//! [`Connector`] turns a [`ConnectionRequest`] into a [`ManagedConnection`]:
//! it resolves the descriptor, reports incomplete configuration as a critical
//! diagnostic, and asks the engine factory for an engine.
//!
//! [`ManagedConnection`] wraps every engine call in the same policy: check that
//! the host resolves, run the call, and turn any failure into a warning and
//! `None`. Callers skip the unit of work and carry on with the next one.

use crate::adapters::{
    DiagnosticSink, Engine, EngineFactory, HostResolver, Severity, SystemHostResolver,
};
use crate::config::{ConnectionRequest, EngineOptions};
use crate::logging::TracingSink;
use crate::models::{IfExists, TableRef, TabularData};
use crate::resolver::{ConnectionDescriptor, ResolutionResult, resolve};
use crate::{Result, SqlStageError};
use std::future::Future;
use std::sync::Arc;

/// Opens managed connections from connection requests.
#[derive(Clone)]
pub struct Connector {
    factory: Arc<dyn EngineFactory>,
    hosts: Arc<dyn HostResolver>,
    sink: Arc<dyn DiagnosticSink>,
    options: EngineOptions,
}

impl Connector {
    /// Creates a connector using DNS host checks, tracing diagnostics and
    /// default engine options.
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            factory,
            hosts: Arc::new(SystemHostResolver::default()),
            sink: Arc::new(TracingSink),
            options: EngineOptions::default(),
        }
    }

    /// Builder method to set the host resolver.
    pub fn with_host_resolver(mut self, hosts: Arc<dyn HostResolver>) -> Self {
        self.hosts = hosts;
        self
    }

    /// Builder method to set the diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Builder method to set engine options.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolves a request, reporting missing fields as a critical diagnostic.
    ///
    /// # Errors
    /// Returns `ConfigurationIncomplete` with every missing field.
    pub fn resolve(&self, request: &ConnectionRequest) -> Result<ConnectionDescriptor> {
        match resolve(request.kind, request.auth, &request.driver, &request.fields) {
            ResolutionResult::Resolved(descriptor) => {
                self.sink.emit(
                    Severity::Debug,
                    &format!("Resolved '{}' to {}", request.name, descriptor),
                );
                Ok(descriptor)
            }
            ResolutionResult::Incomplete(missing) => {
                self.sink.emit(
                    Severity::Critical,
                    &format!(
                        "Check your configuration for '{}', found empty values in: {}",
                        request.name, missing
                    ),
                );
                Err(SqlStageError::ConfigurationIncomplete {
                    kind: request.kind,
                    missing,
                })
            }
        }
    }

    /// Resolves a request and creates an engine for it.
    ///
    /// No network traffic happens here beyond what the factory does; host
    /// checks run per operation.
    ///
    /// # Errors
    /// Returns `ConfigurationIncomplete` for missing fields, or the factory's
    /// error if the engine cannot be created.
    pub async fn connect(&self, request: &ConnectionRequest) -> Result<ManagedConnection> {
        let descriptor = self.resolve(request)?;
        let engine = self.factory.create(&descriptor, &self.options).await?;

        Ok(ManagedConnection {
            name: request.name.clone(),
            descriptor,
            engine,
            hosts: Arc::clone(&self.hosts),
            sink: Arc::clone(&self.sink),
        })
    }

    /// Confirms the factory can build an engine for a resolved descriptor.
    ///
    /// The engine is disposed straight away; nothing is dialled unless the
    /// factory itself connects.
    ///
    /// # Errors
    /// Returns the factory's error, typically `UnsupportedFeature` when this
    /// build has no engine for the descriptor.
    pub async fn ensure_engine(&self, descriptor: &ConnectionDescriptor) -> Result<()> {
        let engine = self.factory.create(descriptor, &self.options).await?;
        engine.dispose().await;
        Ok(())
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A resolved connection whose operations never fail loudly.
pub struct ManagedConnection {
    name: String,
    descriptor: ConnectionDescriptor,
    engine: Box<dyn Engine>,
    hosts: Arc<dyn HostResolver>,
    sink: Arc<dyn DiagnosticSink>,
}

impl ManagedConnection {
    /// The configured connection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved descriptor.
    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// Checks that the host resolves, warning if it does not.
    pub async fn host_reachable(&self) -> bool {
        let host = &self.descriptor.endpoint().host;
        if self.hosts.resolve_host(host).await {
            true
        } else {
            self.sink.emit(
                Severity::Warning,
                &format!("Error while resolving hostname: {}", host),
            );
            false
        }
    }

    async fn guarded<T, F>(&self, operation: F) -> Option<T>
    where
        F: Future<Output = Result<T>>,
    {
        if !self.host_reachable().await {
            return None;
        }

        match operation.await {
            Ok(value) => Some(value),
            Err(e) => {
                self.sink.emit(Severity::Warning, &format!("{}: {}", self.name, e));
                None
            }
        }
    }

    /// Runs a query. `None` if the host is unreachable or the query fails.
    pub async fn query(&self, sql: &str) -> Option<TabularData> {
        self.guarded(self.engine.query(sql)).await
    }

    /// Reads a whole table. `None` if the host is unreachable or the read fails.
    pub async fn fetch_table(&self, table: &TableRef) -> Option<TabularData> {
        self.guarded(self.engine.fetch_table(table)).await
    }

    /// Pushes rows into a table. Returns the number of rows written, or
    /// `None` if the host is unreachable or the insert fails.
    pub async fn push_data(
        &self,
        data: &TabularData,
        table: &TableRef,
        if_exists: IfExists,
    ) -> Option<u64> {
        let written = self
            .guarded(self.engine.append(data, table, if_exists))
            .await?;
        self.sink.emit(
            Severity::Debug,
            &format!("Pushed {} rows into {} on '{}'", written, table, self.name),
        );
        Some(written)
    }

    /// Executes a data-modifying statement. Returns the affected row count,
    /// or `None` if the host is unreachable or the statement fails.
    pub async fn update_data(&self, sql: &str) -> Option<u64> {
        self.guarded(self.engine.execute(sql)).await
    }

    /// Releases the engine's clients.
    pub async fn dispose(self) {
        self.engine.dispose().await;
    }
}

impl std::fmt::Debug for ManagedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedConnection")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
