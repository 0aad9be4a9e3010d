//! Relay server setup
//!
//! Provides the HTTP router, store selection, and the process lifecycle.

mod handler;
mod response;
mod state;

pub use handler::{health_handler, relay_handler, ConnectParams};
pub use response::{HealthResponse, Rejection};
pub use state::RelayState;

use crate::hub::{Hub, HubSettings};
use axum::{routing::get, Router};
use chat_common::{AppConfig, AppError, JwtService};
use chat_core::MessageStore;
use chat_db::{MemoryMessageStore, PgMessageStore};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

/// Create the relay router
pub fn create_router() -> Router<RelayState> {
    Router::new()
        .route("/ws", get(relay_handler))
        .route("/health", get(health_handler))
}

/// Build the complete application
pub fn create_app(state: RelayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Pick the message store: PostgreSQL when configured, otherwise in-memory
pub async fn create_store(config: &AppConfig) -> Result<Arc<dyn MessageStore>, AppError> {
    let Some(database) = &config.database else {
        tracing::warn!("DATABASE_URL not set, messages will be kept in memory only");
        return Ok(Arc::new(MemoryMessageStore::new()));
    };

    tracing::info!("Connecting to PostgreSQL...");
    let pool = chat_db::create_pool(&chat_db::DatabaseConfig::from(database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    tracing::info!("PostgreSQL connection established");

    Ok(Arc::new(PgMessageStore::new(pool)))
}

/// Create the hub and the state that fronts it
///
/// The returned hub must be spawned with [`Hub::run`] before sessions can
/// be served.
pub fn create_relay(config: &AppConfig, store: Arc<dyn MessageStore>) -> (RelayState, Hub) {
    let (hub, handle) = Hub::new(store, HubSettings::from(&config.relay));
    let jwt = JwtService::new(&config.jwt.secret);
    (RelayState::new(handle, jwt, &config.relay), hub)
}

/// Serve the relay on an already bound listener until `shutdown` resolves
pub async fn run_server<F>(app: Router, listener: TcpListener, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Relay listening on ws://{}/ws", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))
}

/// Run the complete relay with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.server.address();

    let store = create_store(&config).await?;
    let (state, hub) = create_relay(&config, store);

    let (stop_tx, stop_rx) = watch::channel(false);
    let hub_task = tokio::spawn(hub.run(stopped(stop_rx)));

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    let result = run_server(create_app(state), listener, async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    })
    .await;

    if let Err(e) = hub_task.await {
        tracing::error!(error = %e, "Hub task failed");
    }
    tracing::info!("Relay stopped");

    result
}

/// Resolves once the flag flips to true or its sender is gone
async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
