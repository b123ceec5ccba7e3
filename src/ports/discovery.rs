use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One concrete, reachable process implementing a logical service.
///
/// Instances are ephemeral: the gateway fetches a fresh set per request and
/// never caches them across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub address: String,
    pub port: u16,
}

impl ServiceInstance {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// `host:port` form used to build the forwarding URL.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Error type for discovery lookups
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// The registry itself could not be reached within the lookup deadline.
    #[error("service registry unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for discovery operations
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Discovery defines the port (interface) for resolving logical service names
/// to live network locations.
#[async_trait]
pub trait Discovery: Send + Sync + 'static {
    /// Resolve the current instances of a logical service.
    ///
    /// Unknown services resolve to an empty list rather than an error, so
    /// callers have a single failure path. The returned order carries no
    /// freshness ranking. Read-only and idempotent; one bounded network call,
    /// no internal retry.
    async fn resolve(&self, service_name: &str) -> DiscoveryResult<Vec<ServiceInstance>>;
}
