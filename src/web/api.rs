//! REST API handlers for the relay surface

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::PhoneSettings;
use crate::phone;
use crate::provider::SessionProvider;
use crate::state::SharedState;

/// Helper to create JSON error responses
fn json_error(status: StatusCode, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({"error": message})))
}

/// Shared application state for API handlers
pub struct ApiState {
    pub app_state: SharedState,
    pub provider: Arc<dyn SessionProvider>,
    pub phone: PhoneSettings,
    pub send_timeout: Duration,
}

/// Send request body
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub whatsapp_ready: bool,
    pub qr_available: bool,
    pub mode: &'static str,
    pub timestamp: String,
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ready: bool,
    pub qr_available: bool,
    pub client_state: &'static str,
}

/// Successful send response
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub success: bool,
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub phone: String,
    pub message: String,
    pub mode: &'static str,
    pub timestamp: String,
}

/// Service health and session readiness
pub async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let snap = state.app_state.read().snapshot();
    Json(HealthResponse {
        status: "ok",
        whatsapp_ready: snap.is_ready(),
        qr_available: snap.qr_available(),
        mode: state.provider.mode(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Current pairing code, if one is pending
pub async fn pairing_code(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let snap = state.app_state.read().snapshot();
    if let Some(code) = snap.pairing_code {
        Ok(Json(serde_json::json!({"qr": code})))
    } else if snap.is_ready() {
        Ok(Json(
            serde_json::json!({"message": "WhatsApp is already connected"}),
        ))
    } else {
        Err(json_error(StatusCode::NOT_FOUND, "QR code not available"))
    }
}

/// Send a message through the session provider
pub async fn send_message(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendResponse>, (StatusCode, Json<serde_json::Value>)> {
    // Readiness wins over payload validation
    let snap = state.app_state.read().snapshot();
    if !snap.is_ready() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "error": "WhatsApp client not ready",
                "qr_available": snap.qr_available(),
            })),
        ));
    }

    if req.phone.is_empty() || req.message.is_empty() {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "Phone and message are required",
        ));
    }

    let address = phone::normalize(
        &req.phone,
        &state.phone.default_country_prefix,
        &state.phone.domain_suffix,
    );
    tracing::info!("API: send to={}", address);

    match tokio::time::timeout(
        state.send_timeout,
        state.provider.send_message(&address, &req.message),
    )
    .await
    {
        Ok(Ok(receipt)) => Ok(Json(SendResponse {
            success: true,
            message_id: receipt.message_id,
            phone: req.phone,
            message: req.message,
            mode: state.provider.mode(),
            timestamp: receipt.timestamp.to_rfc3339(),
        })),
        Ok(Err(e)) => {
            tracing::warn!("API: send failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Failed to send message",
                    "details": e.to_string(),
                })),
            ))
        }
        Err(_) => {
            tracing::warn!("API: send timed out after {:?}", state.send_timeout);
            Err(json_error(StatusCode::GATEWAY_TIMEOUT, "Send timed out"))
        }
    }
}

/// Session readiness and client state tag
pub async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    let snap = state.app_state.read().snapshot();
    Json(StatusResponse {
        ready: snap.is_ready(),
        qr_available: snap.qr_available(),
        client_state: snap.readiness.as_tag(),
    })
}
