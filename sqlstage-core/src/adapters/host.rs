//! DNS-backed host resolution.

use super::HostResolver;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Resolves host names through the system resolver.
///
/// Only the host part matters; a port is appended for the lookup call and
/// never dialled.
#[derive(Debug, Clone, Copy)]
pub struct SystemHostResolver {
    timeout: Duration,
}

impl Default for SystemHostResolver {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

impl SystemHostResolver {
    /// Creates a resolver that gives up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl HostResolver for SystemHostResolver {
    async fn resolve_host(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }

        match tokio::time::timeout(self.timeout, tokio::net::lookup_host((host, 0))).await {
            Ok(Ok(mut addrs)) => addrs.next().is_some(),
            Ok(Err(e)) => {
                debug!("Lookup of {} failed: {}", host, e);
                false
            }
            Err(_) => {
                debug!("Lookup of {} timed out after {:?}", host, self.timeout);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_loopback_literal() {
        let resolver = SystemHostResolver::default();
        assert!(resolver.resolve_host("127.0.0.1").await);
    }

    #[tokio::test]
    async fn test_empty_host_does_not_resolve() {
        let resolver = SystemHostResolver::default();
        assert!(!resolver.resolve_host("").await);
    }
}
