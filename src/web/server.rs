//! Web server implementation using axum

use anyhow::Result;
use axum::http::{HeaderName, Method};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::provider::SessionProvider;
use crate::state::SharedState;

use super::api::{self, ApiState};

/// HTTP control surface for the relay
pub struct WebServer {
    settings: Settings,
    app_state: SharedState,
    provider: Arc<dyn SessionProvider>,
}

impl WebServer {
    /// Create a new web server
    pub fn new(
        settings: Settings,
        app_state: SharedState,
        provider: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            settings,
            app_state,
            provider,
        }
    }

    /// Start the web server in a background task
    pub fn start(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }

    /// Run the web server
    async fn run(self) -> Result<()> {
        let port = self.settings.server.port;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let api_state = Arc::new(ApiState {
            app_state: self.app_state.clone(),
            provider: self.provider.clone(),
            phone: self.settings.phone.clone(),
            send_timeout: Duration::from_secs(self.settings.server.send_timeout_secs),
        });

        // The surface carries no credentials; callers live on other hosts
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([HeaderName::from_static("content-type")]);

        let app = Router::new()
            .route("/health", get(api::health))
            .route("/qr", get(api::pairing_code))
            .route("/send", post(api::send_message))
            .route("/status", get(api::status))
            .with_state(api_state)
            .layer(TraceLayer::new_for_http())
            .layer(cors);

        tracing::info!("Relay server listening on http://0.0.0.0:{}", port);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
