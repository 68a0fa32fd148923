// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; components receive the loaded
//! `Config` by value and never consult the environment afterwards.

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite identity database file
    pub database_path: String,
    /// HTTP server port
    pub port: u16,
    /// TCP bind address for the identity service endpoint
    pub identity_bind: String,
    /// Session expiry window in seconds
    pub session_ttl_secs: u64,
    /// Signing key for session tokens (raw bytes)
    pub token_signing_key: Vec<u8>,
    /// Discard all identity data and recreate empty schema on startup
    pub empty_database: bool,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            database_path: "authgate-test.db".to_string(),
            port: 8080,
            identity_bind: "127.0.0.1:5556".to_string(),
            session_ttl_secs: 3600,
            token_signing_key: b"test_signing_key_32_bytes_long!!".to_vec(),
            empty_database: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            database_path: env::var("DATABASE_PATH")
                .map_err(|_| ConfigError::Missing("DATABASE_PATH"))?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            identity_bind: env::var("IDENTITY_BIND")
                .unwrap_or_else(|_| "127.0.0.1:5556".to_string()),
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("SESSION_TTL_SECS"))?,
            token_signing_key: env::var("TOKEN_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("TOKEN_SIGNING_KEY"))?
                .into_bytes(),
            empty_database: env::var("EMPTY_DATABASE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    /// Session expiry window as a `Duration`.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Environment variable has an invalid value: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("DATABASE_PATH", "/tmp/authgate.db");
        env::set_var("TOKEN_SIGNING_KEY", "test_signing_key_32_bytes_long!!");
        env::set_var("SESSION_TTL_SECS", "60");
        env::set_var("EMPTY_DATABASE", "true");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.database_path, "/tmp/authgate.db");
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl(), Duration::from_secs(60));
        assert!(config.empty_database);
    }
}
