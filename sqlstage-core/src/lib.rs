//! Core library for SQLStage.
//!
//! SQLStage moves rows from a relational source into a staging table in a
//! second store. This crate holds the pieces shared by the CLI:
//!
//! - [`resolver`]: pure resolution of connection fields into descriptors
//! - [`config`]: job configuration files and engine options
//! - [`adapters`]: engine, host resolver and diagnostic sink traits
//! - [`connection`]: managed connections with warn-and-skip failure handling
//! - [`models`]: tabular data carried between engines
//!
//! # Security Guarantees
//! - Passwords are held in zeroizing containers
//! - Descriptors and field sets redact secrets in `Debug` and `Display`
//! - Error messages never contain connection addresses

pub mod adapters;
pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod models;
pub mod resolver;
pub mod security;

// Re-export commonly used types
pub use adapters::{
    DefaultEngineFactory, DiagnosticSink, Engine, EngineFactory, HostResolver, Severity,
    SystemHostResolver,
};
pub use config::{ConnectionRequest, EngineOptions, StageConfig};
pub use connection::{Connector, ManagedConnection};
pub use error::{Result, SqlStageError};
pub use logging::{TracingSink, init_logging};
pub use models::{IfExists, TableRef, TabularData, Value};
pub use resolver::{
    AuthMode, ConnectionDescriptor, ConnectionFields, ConnectionKind, FieldName, FieldValue,
    MissingFields, ResolutionResult, resolve,
};
