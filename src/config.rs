//! Server configuration, read from environment variables.

use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Path to the libSQL database file.
    pub db_path: String,
    /// Maximum requests per client IP per rate-limit window.
    pub rate_limit: u32,
    /// Rate-limit window length.
    pub rate_window: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            db_path: "./data/vfx-academy.db".to_string(),
            rate_limit: 100,
            rate_window: Duration::from_secs(900), // 15 minutes
        }
    }
}

impl ServerConfig {
    /// Build a config from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("VFX_ACADEMY_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let db_path =
            std::env::var("VFX_ACADEMY_DB_PATH").unwrap_or_else(|_| defaults.db_path.clone());

        let rate_limit = std::env::var("VFX_ACADEMY_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit);

        let rate_window = std::env::var("VFX_ACADEMY_RATE_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.rate_window);

        Self {
            port,
            db_path,
            rate_limit,
            rate_window,
        }
    }
}
