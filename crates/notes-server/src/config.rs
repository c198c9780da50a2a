// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Default store when none is configured: a SQLite file in the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:notes.db?mode=rwc";

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable lines.
    Text,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" => Ok(Self::Text),
            _ => Err(()),
        }
    }
}

/// Notes server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite or PostgreSQL connection URL
    pub database_url: String,
    /// HTTP listen address
    pub http_addr: SocketAddr,
    /// Service name reported by `/`
    pub app_name: String,
    /// Debug mode lowers the default log level
    pub debug: bool,
    /// Log line format
    pub log_format: LogFormat,
    /// Connection pool size
    pub db_max_connections: u32,
    /// Time budget for each persistence operation
    pub db_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `NOTES_DATABASE_URL` or `DATABASE_URL`: store URL (default: `sqlite:notes.db?mode=rwc`)
    /// - `NOTES_HTTP_PORT`: HTTP port (default: 8000)
    /// - `NOTES_APP_NAME`: service name (default: "Notes API")
    /// - `NOTES_DEBUG`: `true`/`1` for debug logging (default: true)
    /// - `NOTES_LOG_FORMAT`: `json` or `text` (default: json)
    /// - `NOTES_DB_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `NOTES_DB_TIMEOUT_MS`: per-operation timeout (default: 5000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("NOTES_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        if !is_supported_database_url(&database_url) {
            return Err(ConfigError::UnsupportedDatabase(database_url));
        }

        let http_port: u16 = std::env::var("NOTES_HTTP_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("NOTES_HTTP_PORT", "must be a valid port number"))?;

        let app_name = std::env::var("NOTES_APP_NAME").unwrap_or_else(|_| "Notes API".to_string());

        let debug = std::env::var("NOTES_DEBUG")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        let log_format = std::env::var("NOTES_LOG_FORMAT")
            .unwrap_or_else(|_| "json".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("NOTES_LOG_FORMAT", "must be 'json' or 'text'"))?;

        let db_max_connections: u32 = std::env::var("NOTES_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::Invalid(
                "NOTES_DB_MAX_CONNECTIONS",
                "must be a positive integer",
            ))?;

        let db_timeout_ms: u64 = std::env::var("NOTES_DB_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::Invalid(
                "NOTES_DB_TIMEOUT_MS",
                "must be a positive number of milliseconds",
            ))?;

        Ok(Self {
            database_url,
            http_addr: SocketAddr::from(([0, 0, 0, 0], http_port)),
            app_name,
            debug,
            log_format,
            db_max_connections,
            db_timeout: Duration::from_millis(db_timeout_ms),
        })
    }

    /// Default log filter directive.
    pub fn default_log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

fn is_supported_database_url(url: &str) -> bool {
    ["sqlite:", "postgres://", "postgresql://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),

    /// The database URL names an unsupported backend.
    #[error("unsupported database URL '{0}': expected sqlite:, postgres:// or postgresql://")]
    UnsupportedDatabase(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 8] = [
        "NOTES_DATABASE_URL",
        "DATABASE_URL",
        "NOTES_HTTP_PORT",
        "NOTES_APP_NAME",
        "NOTES_DEBUG",
        "NOTES_LOG_FORMAT",
        "NOTES_DB_MAX_CONNECTIONS",
        "NOTES_DB_TIMEOUT_MS",
    ];

    /// Helper to set env vars for a test and restore them after
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        /// Start from a clean slate for every variable the config reads.
        fn clean() -> Self {
            let mut guard = Self { vars: Vec::new() };
            for key in VARS {
                guard.remove(key);
            }
            guard
        }

        fn set(&mut self, key: &str, value: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::set_var(key, value) };
        }

        fn remove(&mut self, key: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::remove_var(key) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.drain(..).rev() {
                // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
                unsafe {
                    match value {
                        Some(v) => env::set_var(&key, v),
                        None => env::remove_var(&key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _guard = EnvGuard::clean();

        let config = Config::from_env().unwrap();

        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.http_addr.port(), 8000);
        assert_eq!(config.app_name, "Notes API");
        assert!(config.debug);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.db_timeout, Duration::from_millis(5000));
        assert_eq!(config.default_log_level(), "debug");
    }

    #[test]
    fn test_config_database_url_fallback() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();

        guard.set("DATABASE_URL", "postgres://localhost/notes");
        assert_eq!(
            Config::from_env().unwrap().database_url,
            "postgres://localhost/notes"
        );

        guard.set("NOTES_DATABASE_URL", "sqlite::memory:");
        assert_eq!(Config::from_env().unwrap().database_url, "sqlite::memory:");
    }

    #[test]
    fn test_config_all_custom() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();

        guard.set("NOTES_DATABASE_URL", "postgresql://user:pass@db:5432/notes");
        guard.set("NOTES_HTTP_PORT", "9090");
        guard.set("NOTES_APP_NAME", "Team Notes");
        guard.set("NOTES_DEBUG", "false");
        guard.set("NOTES_LOG_FORMAT", "text");
        guard.set("NOTES_DB_MAX_CONNECTIONS", "3");
        guard.set("NOTES_DB_TIMEOUT_MS", "250");

        let config = Config::from_env().unwrap();

        assert_eq!(config.database_url, "postgresql://user:pass@db:5432/notes");
        assert_eq!(config.http_addr.port(), 9090);
        assert_eq!(config.app_name, "Team Notes");
        assert!(!config.debug);
        assert_eq!(config.default_log_level(), "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.db_max_connections, 3);
        assert_eq!(config.db_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_config_invalid_port() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();

        guard.set("NOTES_HTTP_PORT", "99999"); // > 65535

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("NOTES_HTTP_PORT", _)));
    }

    #[test]
    fn test_config_invalid_log_format() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();

        guard.set("NOTES_LOG_FORMAT", "xml");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("NOTES_LOG_FORMAT", _)));
    }

    #[test]
    fn test_config_rejects_zero_pool_and_timeout() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();

        guard.set("NOTES_DB_MAX_CONNECTIONS", "0");
        assert!(matches!(
            Config::from_env().unwrap_err(),
            ConfigError::Invalid("NOTES_DB_MAX_CONNECTIONS", _)
        ));

        guard.set("NOTES_DB_MAX_CONNECTIONS", "4");
        guard.set("NOTES_DB_TIMEOUT_MS", "-5");
        assert!(matches!(
            Config::from_env().unwrap_err(),
            ConfigError::Invalid("NOTES_DB_TIMEOUT_MS", _)
        ));
    }

    #[test]
    fn test_config_unsupported_database() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();

        guard.set("NOTES_DATABASE_URL", "mysql://localhost/notes");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedDatabase(_)));
        assert!(err.to_string().contains("mysql://localhost/notes"));
    }

    #[test]
    fn test_config_error_display() {
        let invalid = ConfigError::Invalid("MY_VAR", "must be a number");
        assert_eq!(invalid.to_string(), "invalid value for MY_VAR: must be a number");
    }
}
