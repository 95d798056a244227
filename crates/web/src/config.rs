use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::Level;
use wharf_http::connection::{ConnectionConfig, DEFAULT_KEEP_ALIVE_TIMEOUT, DEFAULT_MAX_REQUEST_SIZE};

/// Server wide settings.
///
/// Every field has a default, so a partial document deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on concurrently served connections, unbounded when `None`.
    pub max_connections: Option<usize>,
    /// Ceiling for one request, head plus body, in bytes.
    pub max_request_size: usize,
    /// Idle window of a kept-alive connection, in seconds. Zero counts as one.
    pub keep_alive_timeout: u64,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_connections: None,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            keep_alive_timeout: DEFAULT_KEEP_ALIVE_TIMEOUT.as_secs(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_timeout.max(1))
    }

    /// The configured level, `INFO` if it doesn't parse.
    pub fn level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig { max_request_size: self.max_request_size, keep_alive_timeout: self.keep_alive() }
    }
}
