//! Live provider delegating to an external WhatsApp Web bridge
//!
//! The bridge process owns the protocol session (browser automation, session
//! persistence). This side holds a WebSocket to it: lifecycle events arrive
//! as JSON frames and are forwarded onto the event channel; sends are
//! request/reply frames matched by id through a pending map.

use async_trait::async_trait;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use crate::config::GatewaySettings;

use super::{ProviderError, SendReceipt, SessionEvent, SessionProvider};

/// Frame exchanged with the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum GatewayFrame {
    /// Bridge issued a pairing code
    Qr { code: String },
    /// Device linking succeeded
    Authenticated,
    /// Session can send messages
    Ready,
    /// Device linking failed
    AuthFailure { reason: String },
    /// Session lost
    Disconnected { reason: String },
    /// Outbound send command (relay to bridge)
    Send { id: String, to: String, body: String },
    /// Send acknowledged
    SendResult { id: String, message_id: String },
    /// Send rejected
    SendError { id: String, error: String },
}

/// Send queued for the connection task
struct SendCommand {
    id: String,
    to: String,
    body: String,
    reply: oneshot::Sender<Result<SendReceipt, ProviderError>>,
}

type PendingReplies = Mutex<HashMap<String, oneshot::Sender<Result<SendReceipt, ProviderError>>>>;

/// Provider backed by a WebSocket connection to the bridge
pub struct GatewayProvider {
    settings: GatewaySettings,
    cmd_tx: mpsc::Sender<SendCommand>,
    connected: AtomicBool,
    running: AtomicBool,
    shutdown: Notify,
    pending: PendingReplies,
    events: mpsc::Sender<SessionEvent>,
}

impl GatewayProvider {
    /// Start the connection task and return the provider handle
    pub fn start(settings: GatewaySettings, events: mpsc::Sender<SessionEvent>) -> Arc<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let provider = Arc::new(Self {
            settings,
            cmd_tx,
            connected: AtomicBool::new(false),
            running: AtomicBool::new(true),
            shutdown: Notify::new(),
            pending: Mutex::new(HashMap::new()),
            events,
        });

        let task = provider.clone();
        tokio::spawn(async move { task.run(cmd_rx).await });

        provider
    }

    /// Connection loop with capped exponential backoff
    async fn run(self: Arc<Self>, mut cmd_rx: mpsc::Receiver<SendCommand>) {
        let mut backoff_ms = 500u64;

        while self.running.load(Ordering::Relaxed) {
            match connect_async(self.settings.url.as_str()).await {
                Ok((ws, _)) => {
                    backoff_ms = 500;
                    tracing::info!("Gateway connected: {}", self.settings.url);
                    self.connected.store(true, Ordering::Relaxed);

                    let result = self.drive(ws, &mut cmd_rx).await;

                    self.connected.store(false, Ordering::Relaxed);
                    self.fail_pending();
                    match result {
                        // Shutdown or command channel closed
                        Ok(()) => break,
                        Err(e) => {
                            tracing::warn!("Gateway connection lost: {e}");
                            self.forward(SessionEvent::Disconnected(
                                "gateway connection lost".to_string(),
                            ))
                            .await;
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!("Gateway connect failed (will retry): {e}");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(backoff_ms)) => {}
                _ = self.shutdown.notified() => break,
            }
            backoff_ms = (backoff_ms * 2).min(10_000);
        }
        tracing::debug!("Gateway task stopped");
    }

    /// Pump one established connection until it drops or we shut down
    async fn drive(
        &self,
        ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
        cmd_rx: &mut mpsc::Receiver<SendCommand>,
    ) -> anyhow::Result<()> {
        let (mut sink, mut stream) = ws.split();

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str()).await,
                    Some(Ok(Message::Close(_))) => anyhow::bail!("bridge closed the connection"),
                    Some(Ok(_)) => {} // ping/pong/binary: nothing to do
                    Some(Err(e)) => return Err(e.into()),
                    None => anyhow::bail!("bridge stream ended"),
                },
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => {
                        let frame = GatewayFrame::Send {
                            id: cmd.id.clone(),
                            to: cmd.to,
                            body: cmd.body,
                        };
                        let json = serde_json::to_string(&frame)?;
                        self.pending.lock().insert(cmd.id, cmd.reply);
                        sink.send(Message::Text(json.into())).await?;
                    }
                    None => return Ok(()),
                },
                _ = self.shutdown.notified() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(());
                }
            }
        }
    }

    /// Dispatch one inbound frame
    async fn handle_frame(&self, text: &str) {
        let frame: GatewayFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Unparseable gateway frame: {e}");
                return;
            }
        };

        match frame {
            GatewayFrame::Qr { code } => self.forward(SessionEvent::PairingCodeIssued(code)).await,
            GatewayFrame::Authenticated => self.forward(SessionEvent::Authenticated).await,
            GatewayFrame::Ready => self.forward(SessionEvent::Ready).await,
            GatewayFrame::AuthFailure { reason } => {
                self.forward(SessionEvent::AuthFailure(reason)).await
            }
            GatewayFrame::Disconnected { reason } => {
                self.forward(SessionEvent::Disconnected(reason)).await
            }
            GatewayFrame::SendResult { id, message_id } => {
                if let Some(reply) = self.pending.lock().remove(&id) {
                    let _ = reply.send(Ok(SendReceipt {
                        message_id,
                        timestamp: Utc::now(),
                    }));
                }
            }
            GatewayFrame::SendError { id, error } => {
                if let Some(reply) = self.pending.lock().remove(&id) {
                    let _ = reply.send(Err(ProviderError::Rejected(error)));
                }
            }
            GatewayFrame::Send { .. } => {
                tracing::warn!("Unexpected send frame from bridge");
            }
        }
    }

    async fn forward(&self, event: SessionEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!("Event consumer dropped");
        }
    }

    /// Fail all in-flight sends after a connection drop
    fn fail_pending(&self) {
        for (_, reply) in self.pending.lock().drain() {
            let _ = reply.send(Err(ProviderError::ConnectionClosed));
        }
    }
}

#[async_trait]
impl SessionProvider for GatewayProvider {
    async fn send_message(&self, address: &str, body: &str) -> Result<SendReceipt, ProviderError> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(ProviderError::Unavailable(
                "gateway not connected".to_string(),
            ));
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = SendCommand {
            id: Uuid::new_v4().to_string(),
            to: address.to_string(),
            body: body.to_string(),
            reply: reply_tx,
        };

        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| ProviderError::Unavailable("gateway task stopped".to_string()))?;

        reply_rx
            .await
            .unwrap_or(Err(ProviderError::ConnectionClosed))
    }

    async fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.shutdown.notify_one();
    }

    fn mode(&self) -> &'static str {
        "live"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_event_frames_parse() {
        let frame: GatewayFrame = serde_json::from_str(r#"{"type":"qr","code":"1@AAA"}"#).unwrap();
        assert!(matches!(frame, GatewayFrame::Qr { code } if code == "1@AAA"));

        let frame: GatewayFrame = serde_json::from_str(r#"{"type":"ready"}"#).unwrap();
        assert!(matches!(frame, GatewayFrame::Ready));

        let frame: GatewayFrame =
            serde_json::from_str(r#"{"type":"auth_failure","reason":"expired"}"#).unwrap();
        assert!(matches!(frame, GatewayFrame::AuthFailure { reason } if reason == "expired"));
    }

    #[test]
    fn test_send_frame_wire_shape() {
        let frame = GatewayFrame::Send {
            id: "r-1".to_string(),
            to: "375291234567@c.us".to_string(),
            body: "hello".to_string(),
        };
        let json: serde_json::Value = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "send");
        assert_eq!(json["to"], "375291234567@c.us");
        assert_eq!(json["body"], "hello");
    }

    #[test]
    fn test_reply_frames_parse() {
        let frame: GatewayFrame =
            serde_json::from_str(r#"{"type":"send_result","id":"r-1","message_id":"true_123"}"#)
                .unwrap();
        assert!(matches!(frame, GatewayFrame::SendResult { message_id, .. } if message_id == "true_123"));

        let frame: GatewayFrame =
            serde_json::from_str(r#"{"type":"send_error","id":"r-1","error":"no session"}"#)
                .unwrap();
        assert!(matches!(frame, GatewayFrame::SendError { error, .. } if error == "no session"));
    }

    #[tokio::test]
    async fn test_send_while_unconnected_fails_fast() {
        let (events, _rx) = mpsc::channel(8);
        let settings = GatewaySettings {
            url: "ws://127.0.0.1:9/session".to_string(),
        };
        let provider = GatewayProvider::start(settings, events);

        let err = provider
            .send_message("375291234567@c.us", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));

        provider.shutdown().await;
    }
}
