//! Session provider abstraction
//!
//! The provider owns the actual messaging protocol session (device linking,
//! session persistence, delivery). Implementations emit [`SessionEvent`]s
//! over an mpsc channel handed to their constructor; a single consumer task
//! applies them to the shared state in order.

mod events;
mod gateway;
mod mock;

pub use events::spawn_event_consumer;
pub use gateway::GatewayProvider;
pub use mock::MockProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Lifecycle event emitted by a session provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A (new) pairing code was issued for device linking
    PairingCodeIssued(String),
    /// Device linking succeeded; not yet ready to send
    Authenticated,
    /// The session can send messages
    Ready,
    /// Device linking or re-authentication failed
    AuthFailure(String),
    /// The session was lost
    Disconnected(String),
}

/// Failure of a provider send call
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider cannot take sends right now
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The provider refused the message
    #[error("{0}")]
    Rejected(String),
    /// The connection dropped before a reply arrived
    #[error("provider connection closed before a reply arrived")]
    ConnectionClosed,
}

/// Acknowledgement for a delivered message
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Capability to deliver messages over the session
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Deliver `body` to the normalized `address`
    async fn send_message(&self, address: &str, body: &str) -> Result<SendReceipt, ProviderError>;

    /// Release provider resources before process exit
    async fn shutdown(&self);

    /// Mode tag surfaced in HTTP responses
    fn mode(&self) -> &'static str;
}
