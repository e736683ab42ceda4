//! Event publishing error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventsError {
    /// The event payload could not be serialized to JSON.
    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The broker connection or channel could not be used to publish.
    #[error("broker unavailable: {0}")]
    BrokerUnavailable(String),

    /// The broker rejected the publish (e.g. no route, channel closed).
    #[error("publish failed: {0}")]
    PublishFailed(String),
}
