//! Deterministic fake provider
//!
//! Reports readiness after a fixed delay and acknowledges every send with a
//! synthetic message id. Never issues a pairing code.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{ProviderError, SendReceipt, SessionEvent, SessionProvider};

/// Fake session provider for local development and tests
pub struct MockProvider;

impl MockProvider {
    /// Start the mock; emits `Ready` after `ready_delay`
    pub fn start(events: mpsc::Sender<SessionEvent>, ready_delay: Duration) -> Arc<Self> {
        tokio::spawn(async move {
            tokio::time::sleep(ready_delay).await;
            if events.send(SessionEvent::Ready).await.is_err() {
                tracing::debug!("Event consumer gone before mock readiness");
            }
        });
        Arc::new(Self)
    }
}

#[async_trait]
impl SessionProvider for MockProvider {
    async fn send_message(&self, address: &str, body: &str) -> Result<SendReceipt, ProviderError> {
        tracing::info!("Mock send to {}: {}", address, body);
        Ok(SendReceipt {
            message_id: format!("mock_{}", Uuid::new_v4().simple()),
            timestamp: Utc::now(),
        })
    }

    async fn shutdown(&self) {}

    fn mode(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_after_delay() {
        let (tx, mut rx) = mpsc::channel(8);
        let _provider = MockProvider::start(tx, Duration::from_millis(10));

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("mock must report readiness")
            .unwrap();
        assert_eq!(event, SessionEvent::Ready);
    }

    #[tokio::test]
    async fn test_send_returns_mock_receipt() {
        let (tx, _rx) = mpsc::channel(8);
        let provider = MockProvider::start(tx, Duration::from_millis(10));

        let receipt = provider
            .send_message("375291234567@c.us", "hello")
            .await
            .unwrap();
        assert!(receipt.message_id.starts_with("mock_"));
    }
}
