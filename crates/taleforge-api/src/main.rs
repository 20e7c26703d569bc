//! Taleforge API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use taleforge_api::error::AppError;
use taleforge_api::state::AppState;
use taleforge_core::config::OrchestratorSettings;
use taleforge_core::event::Telemetry;
use taleforge_orchestrator::Orchestrator;
use taleforge_providers::provider_table_from_env;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Taleforge API server");

    // Read configuration from environment.
    let settings = OrchestratorSettings::from_env()?;
    let table = provider_table_from_env(settings.call_timeout)?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    // Bootstrap the provider chain; exhaustion here is fatal.
    let orchestrator = Arc::new(Orchestrator::start(settings, table, Telemetry::tracing()).await?);

    #[cfg(unix)]
    tokio::spawn(reload::on_hangup(orchestrator.clone()));

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = taleforge_api::app(AppState::new(orchestrator))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(unix)]
mod reload {
    use std::sync::Arc;

    use taleforge_core::config::{MODE_FILE_VAR, MODE_VAR};
    use taleforge_orchestrator::Orchestrator;
    use tokio::signal::unix::{SignalKind, signal};

    /// Re-resolves the mode and re-bootstraps on every SIGHUP.
    ///
    /// The token is read from the file named by `TALEFORGE_MODE_FILE` when
    /// set, otherwise from `TALEFORGE_MODE`, otherwise the startup mode.
    pub async fn on_hangup(orchestrator: Arc<Orchestrator>) {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(hangups) => hangups,
            Err(err) => {
                tracing::warn!(error = %err, "SIGHUP reload disabled");
                return;
            }
        };

        while hangups.recv().await.is_some() {
            let mode = match current_mode(&orchestrator).await {
                Ok(mode) => mode,
                Err(err) => {
                    tracing::warn!(error = %err, "cannot read mode file, keeping active policy");
                    continue;
                }
            };
            tracing::info!(mode = %mode, "SIGHUP received, reloading");
            match orchestrator.reload(&mode).await {
                Ok(tier) => tracing::info!(tier = %tier, "reload complete"),
                Err(err) => tracing::error!(error = %err, "reload failed"),
            }
        }
    }

    async fn current_mode(orchestrator: &Orchestrator) -> std::io::Result<String> {
        if let Ok(path) = std::env::var(MODE_FILE_VAR) {
            return tokio::fs::read_to_string(path).await;
        }
        Ok(std::env::var(MODE_VAR).unwrap_or_else(|_| orchestrator.settings().mode.clone()))
    }
}
