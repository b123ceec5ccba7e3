use async_trait::async_trait;
use thiserror::Error;

/// Error type for publish operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PublishError {
    /// The broker rejected the publish or the channel failed
    #[error("broker error: {0}")]
    Broker(String),

    /// The message could not be serialized for the wire
    #[error("message serialization failed: {0}")]
    Serialization(String),
}

/// EventPublisher defines the port (interface) for the append-only message
/// sink behind the administrative publish endpoint.
///
/// The contract is accepted-for-delivery only: a successful publish means the
/// broker took the message (at-most-once, best-effort), not that any consumer
/// received it.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    async fn publish(&self, queue: &str, message: &serde_json::Value) -> Result<(), PublishError>;
}
