//! Tilestats service entry point.
//!
//! Loads `tilestats.yaml`, initializes logging, opens the `SQLite` store,
//! and serves the HTTP API until `Ctrl-C` (or `SIGTERM` on Unix).
//!
//! ```text
//! config --> logging --> SQLite (migrate) --> AppState --> axum server
//!                                                           |
//!                                     shutdown signal --> close streams
//! ```

mod error;
mod logging;

use std::sync::Arc;

use tilestats_core::ServiceConfig;
use tilestats_db::{Database, SqliteConfig};
use tilestats_server::{AppState, ServerConfig, start_server};
use tracing::{info, warn};

use crate::error::DaemonError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, database setup, or the server fails.
#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    let config = ServiceConfig::load()?;
    logging::init(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        database = %config.database.url,
        channel_capacity = config.stream.channel_capacity,
        "tilestats starting"
    );

    let db_config =
        SqliteConfig::new(&config.database.url).with_max_connections(config.database.max_connections);
    let db = Database::connect(&db_config).await?;
    db.run_migrations().await?;

    let state = Arc::new(AppState::from_config(
        db.score_store(),
        db.analytics_store(),
        &config,
    ));

    let server_config = ServerConfig::from(&config.server);
    let result = start_server(&server_config, state, shutdown_signal()).await;

    db.close().await;
    result?;
    info!("tilestats stopped");
    Ok(())
}

/// Resolve on `Ctrl-C`, or `SIGTERM` on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
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
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl-C"),
        () = terminate => info!("received SIGTERM"),
    }
}
