//! Chat Relay Server entry point
//!
//! Run with:
//! ```bash
//! JWT_SECRET=change-me cargo run -p chat-relay
//! ```
//!
//! Configuration is loaded from environment variables.

use chat_common::{try_init_tracing_with_config, AppConfig, Environment, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // APP_ENV decides the log format, so read it before the rest of the config
    let _ = dotenvy::dotenv();
    let tracing_config = TracingConfig::for_environment(Environment::from_env());

    if let Err(e) = try_init_tracing_with_config(tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Relay failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Chat Relay Server...");

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        address = %config.server.address(),
        persistent = config.database.is_some(),
        "Configuration loaded"
    );

    chat_relay::run(config).await?;

    Ok(())
}
