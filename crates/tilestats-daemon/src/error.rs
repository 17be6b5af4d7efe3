//! Error types for the service binary.

use tilestats_core::ConfigError;
use tilestats_db::DbError;
use tilestats_server::ServerError;

/// Errors that abort startup or end the service.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The database could not be opened or migrated.
    #[error("database error: {0}")]
    Database(#[from] DbError),

    /// The HTTP server failed to bind or serve.
    #[error("server error: {0}")]
    Server(#[from] ServerError),
}
