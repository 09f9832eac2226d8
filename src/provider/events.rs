//! Single consumer applying provider events to the shared session state
//!
//! Events are drained in channel order, so the state always reflects the
//! provider's own event sequence. Handlers never mutate state directly.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::pairing::{self, PairingCodeFile};
use crate::state::SharedState;

use super::SessionEvent;

/// Spawn the event consumer task
pub fn spawn_event_consumer(
    state: SharedState,
    mut events: mpsc::Receiver<SessionEvent>,
    pairing_file: PairingCodeFile,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            apply_event(&state, event, &pairing_file);
        }
        tracing::debug!("Provider event channel closed");
    })
}

fn apply_event(state: &SharedState, event: SessionEvent, pairing_file: &PairingCodeFile) {
    match event {
        SessionEvent::PairingCodeIssued(code) => {
            tracing::info!("Pairing code received");
            // Best-effort side channel; the state store is the source of truth
            if let Err(e) = pairing_file.write(&code) {
                tracing::warn!("Pairing code file write failed: {e:#}");
            }
            match pairing::terminal_qr(&code) {
                Some(qr) => tracing::info!("Scan to link device:\n{qr}"),
                None => tracing::warn!("Pairing code too large for a QR render"),
            }
            state.write().on_pairing_code_issued(code);
        }
        SessionEvent::Authenticated => {
            tracing::info!("Session authenticated");
            state.write().on_authenticated();
        }
        SessionEvent::Ready => {
            tracing::info!("Session ready");
            state.write().on_ready();
        }
        SessionEvent::AuthFailure(reason) => {
            tracing::error!("Authentication failed: {reason}");
            state.write().on_auth_failure(reason);
        }
        SessionEvent::Disconnected(reason) => {
            tracing::warn!("Session disconnected: {reason}");
            state.write().on_disconnected(reason);
        }
    }
}
