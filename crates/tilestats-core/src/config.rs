//! Typed service configuration.
//!
//! The configuration lives in `tilestats.yaml` (or the file named by
//! `TILESTATS_CONFIG`). Every section and field is optional; missing
//! values take the defaults below. A handful of environment variables
//! override the file so deployments can adjust connection settings
//! without editing it.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tilestats.yaml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "TILESTATS_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: HttpConfig,

    /// Persistent store settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Notification stream settings.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from the default location.
    ///
    /// Reads the file named by `TILESTATS_CONFIG`, falling back to
    /// `tilestats.yaml`. When neither exists, defaults are used. Environment
    /// overrides are applied in every case.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_owned());
        let path = Path::new(&path);
        if path.exists() {
            return Self::from_file(path);
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. No overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override settings from the process environment.
    ///
    /// - `DATABASE_URL` overrides `database.url`
    /// - `TILESTATS_HOST` overrides `server.host`
    /// - `TILESTATS_PORT` overrides `server.port` (ignored if not a port)
    /// - `RUST_LOG` overrides `logging.level`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override settings from an arbitrary variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("TILESTATS_HOST") {
            self.server.host = val;
        }
        if let Some(port) = lookup("TILESTATS_PORT").and_then(|v| v.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.level = val;
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Persistent store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Notification stream settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StreamConfig {
    /// Tokens buffered per viewer before it is evicted.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Seconds between SSE keep-alive comments. Zero disables them.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

impl StreamConfig {
    /// The keep-alive interval, if enabled.
    pub const fn keep_alive(&self) -> Option<Duration> {
        if self.keep_alive_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.keep_alive_secs))
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

/// Dashboard settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DashboardConfig {
    /// Number of recent events returned with the dashboard data.
    #[serde(default = "default_recent_events")]
    pub recent_events: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_events: default_recent_events(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` expression).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    5001
}

fn default_database_url() -> String {
    "sqlite://tilestats.db".to_owned()
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_channel_capacity() -> usize {
    crate::fanout::DEFAULT_CHANNEL_CAPACITY
}

const fn default_keep_alive_secs() -> u64 {
    15
}

const fn default_recent_events() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_owned()
}
