//! Configuration management
//!
//! Configuration is loaded from a `config.yml` file when present and can be
//! overridden through `PAINTBOX_*` environment variables. Missing values
//! fall back to defaults, so the server starts with no configuration at all.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (credentials are sent for cookie auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5555
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/paintbox.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a session stays valid, in days
    #[serde(default = "default_expiration_days")]
    pub expiration_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiration_days: default_expiration_days(),
        }
    }
}

fn default_expiration_days() -> i64 {
    7
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// A missing or empty file yields the default configuration; an invalid
    /// one is an error with the parser's location details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from file, then apply environment overrides.
    ///
    /// Recognized variables:
    /// - `PAINTBOX_SERVER_HOST`, `PAINTBOX_SERVER_PORT`,
    ///   `PAINTBOX_SERVER_CORS_ORIGIN`
    /// - `PAINTBOX_DATABASE_DRIVER`, `PAINTBOX_DATABASE_URL`
    /// - `PAINTBOX_SESSION_EXPIRATION_DAYS`
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("PAINTBOX_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PAINTBOX_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("PAINTBOX_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("PAINTBOX_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("PAINTBOX_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(days) = std::env::var("PAINTBOX_SESSION_EXPIRATION_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                self.session.expiration_days = days;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5555);
        assert_eq!(config.database.driver, DatabaseDriver::Sqlite);
        assert_eq!(config.database.url, "data/paintbox.db");
        assert_eq!(config.session.expiration_days, 7);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config = Config::load(std::path::Path::new("does-not-exist.yml"))
            .expect("Missing file should yield defaults");
        assert_eq!(config.server.port, 5555);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "server:\n  port: 9000").expect("Failed to write config");

        let config = Config::load(file.path()).expect("Failed to load config");

        assert_eq!(config.server.port, 9000);
        // Unspecified sections keep their defaults
        assert_eq!(config.database.driver, DatabaseDriver::Sqlite);
        assert_eq!(config.session.expiration_days, 7);
    }

    #[test]
    fn test_load_invalid_yaml_is_error() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "server: [not a mapping").expect("Failed to write config");

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_driver_parsing() {
        let config: Config =
            serde_yaml::from_str("database:\n  driver: mysql\n  url: localhost/paintbox")
                .expect("Failed to parse");
        assert_eq!(config.database.driver, DatabaseDriver::Mysql);
        assert_eq!(config.database.url, "localhost/paintbox");
    }
}
