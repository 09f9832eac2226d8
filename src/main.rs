use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use warelay::config::{Config, Settings};
use warelay::pairing::PairingCodeFile;
use warelay::provider::{
    spawn_event_consumer, GatewayProvider, MockProvider, SessionProvider,
};
use warelay::state::SessionState;
use warelay::web::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.merge_env();
    settings.merge_cli(&cli);
    settings.validate();

    let state = SessionState::shared();
    let (event_tx, event_rx) = mpsc::channel(32);

    let provider: Arc<dyn SessionProvider> = if cli.is_mock_mode() {
        MockProvider::start(
            event_tx,
            Duration::from_millis(settings.mock.ready_delay_ms),
        )
    } else {
        GatewayProvider::start(settings.gateway.clone(), event_tx)
    };

    let pairing_file = PairingCodeFile::new(settings.pairing.code_file.clone());
    spawn_event_consumer(state.clone(), event_rx, pairing_file);

    tracing::info!(
        "Starting relay on port {} ({} mode)",
        settings.server.port,
        provider.mode()
    );

    let mut server = WebServer::new(settings, state, provider.clone()).start();

    tokio::select! {
        result = &mut server => result??,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received, shutting down");
            provider.shutdown().await;
            server.abort();
        }
    }

    Ok(())
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("warelay=debug,tower_http=debug")
    } else {
        EnvFilter::new("warelay=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
