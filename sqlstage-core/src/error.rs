//! Error types with credential sanitization.
//!
//! Connection addresses built by the resolver embed passwords. None of the
//! variants below ever carry a raw address; callers log the redacted form
//! produced by [`crate::ConnectionDescriptor::redacted_address`].

use crate::resolver::{ConnectionKind, MissingFields};
use thiserror::Error;

/// Main error type for SQLStage operations.
///
/// # Security
/// All error messages are sanitized to prevent credential leakage.
/// Connection strings and passwords are never included in error output.
#[derive(Debug, Error)]
pub enum SqlStageError {
    /// One or more required connection fields were absent or empty
    #[error("Connection configuration incomplete for {kind}: missing {missing}")]
    ConfigurationIncomplete {
        kind: ConnectionKind,
        missing: MissingFields,
    },

    /// Database connection failed (credentials sanitized)
    #[error("Database connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Query timeout or execution failure
    #[error("Query execution failed: {context}")]
    QueryExecution { context: String },

    /// Unsupported database feature or operation
    #[error("Unsupported operation: {feature} not supported for {database_type}")]
    UnsupportedFeature {
        feature: String,
        database_type: String,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with SqlStageError
pub type Result<T> = std::result::Result<T, SqlStageError>;

impl SqlStageError {
    /// Creates a connection error with sanitized context
    pub fn connection_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a query execution error
    pub fn query_failed(context: impl Into<String>) -> Self {
        Self::QueryExecution {
            context: context.into(),
        }
    }

    /// Creates an unsupported feature error
    pub fn unsupported_feature(
        feature: impl Into<String>,
        database_type: impl Into<String>,
    ) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
            database_type: database_type.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the missing field set when this is a configuration-incomplete error.
    pub fn missing_fields(&self) -> Option<&MissingFields> {
        match self {
            Self::ConfigurationIncomplete { missing, .. } => Some(missing),
            _ => None,
        }
    }
}
