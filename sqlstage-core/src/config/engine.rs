//! Engine tuning options.
//!
//! These are handed to an [`crate::adapters::EngineFactory`] alongside a
//! resolved descriptor.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pool and batching options for a connection engine.
///
/// # Example
/// ```rust
/// use sqlstage_core::config::EngineOptions;
/// use std::time::Duration;
///
/// let options = EngineOptions::default()
///     .with_pool_size(2)
///     .with_pool_timeout(Duration::from_secs(10));
///
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Maximum number of concurrently open clients
    pub pool_size: u32,
    /// How long to wait for a client before giving up
    #[serde(with = "duration_secs")]
    pub pool_timeout: Duration,
    /// Issue a liveness query before each operation
    pub pre_ping: bool,
    /// Rows fetched or inserted per round trip
    pub array_size: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            pool_size: 5,
            pool_timeout: Duration::from_secs(5),
            pre_ping: true,
            array_size: 1000,
        }
    }
}

impl EngineOptions {
    /// Validates engine options.
    ///
    /// # Errors
    /// Returns error if any option is zero or unreasonably large
    pub fn validate(&self) -> crate::Result<()> {
        if self.pool_size == 0 {
            return Err(crate::SqlStageError::configuration(
                "pool_size must be greater than 0",
            ));
        }

        if self.pool_size > 100 {
            return Err(crate::SqlStageError::configuration(
                "pool_size should not exceed 100",
            ));
        }

        if self.pool_timeout.is_zero() {
            return Err(crate::SqlStageError::configuration(
                "pool_timeout must be greater than 0",
            ));
        }

        if self.array_size == 0 {
            return Err(crate::SqlStageError::configuration(
                "array_size must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Builder method to set pool size.
    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Builder method to set pool timeout.
    pub fn with_pool_timeout(mut self, pool_timeout: Duration) -> Self {
        self.pool_timeout = pool_timeout;
        self
    }

    /// Builder method to toggle pre-ping.
    pub fn with_pre_ping(mut self, pre_ping: bool) -> Self {
        self.pre_ping = pre_ping;
        self
    }

    /// Builder method to set array size.
    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_options_default() {
        let options = EngineOptions::default();
        assert_eq!(options.pool_size, 5);
        assert_eq!(options.pool_timeout, Duration::from_secs(5));
        assert!(options.pre_ping);
        assert_eq!(options.array_size, 1000);
    }

    #[test]
    fn test_engine_options_validation() {
        assert!(EngineOptions::default().validate().is_ok());

        let options = EngineOptions::default().with_pool_size(0);
        assert!(options.validate().is_err());

        let options = EngineOptions::default().with_pool_size(101);
        assert!(options.validate().is_err());

        let options = EngineOptions::default().with_pool_timeout(Duration::ZERO);
        assert!(options.validate().is_err());

        let options = EngineOptions::default().with_array_size(0);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_engine_options_partial_json() {
        let options: EngineOptions =
            serde_json::from_str(r#"{"pool_timeout": 30, "pre_ping": false}"#).unwrap();
        assert_eq!(options.pool_timeout, Duration::from_secs(30));
        assert!(!options.pre_ping);
        assert_eq!(options.pool_size, 5);
    }
}
