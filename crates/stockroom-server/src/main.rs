//! Stockroom Server: application entry point.

use std::time::Duration;

use clap::Parser;
use stockroom_db::{DbManager, run_migrations};
use stockroom_server::bootstrap::ensure_admin;
use stockroom_server::config::{LogFormat, ServerConfig};
use stockroom_server::{AppState, router};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "stockroom=info,stockroom_server=info,stockroom_db=info,stockroom_auth=info,tower_http=info";

/// How often expired sessions are swept from the store.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::parse();
    init_tracing(config.log_format);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Stockroom server");

    let db = DbManager::connect(&config.db_config()).await?;
    run_migrations(db.client()).await?;

    let state = AppState::new(
        db.client().clone(),
        config.auth_config(),
        config.app_settings(),
    )
    .await?;
    ensure_admin(&state.auth, &config.admin_password).await?;

    let auth = state.auth.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            match auth.cleanup_expired_sessions().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Swept expired sessions"),
                Err(e) => error!(error = %e, "Session sweep failed"),
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Stockroom server stopped");
    Ok(())
}
