//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

/// Authentication configuration
///
/// The access and refresh secrets are independent: leaking one must not
/// compromise tokens signed with the other. TTLs are deliberately lopsided,
/// minutes for access tokens and days for refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_access_secret")]
    pub access_token_secret: String,
    #[serde(default = "default_access_ttl_minutes")]
    pub access_token_ttl_minutes: i64,
    #[serde(default = "default_refresh_secret")]
    pub refresh_token_secret: String,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_token_ttl_days: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: "pretty".to_string(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_db_path() -> String {
    "./data/clipstream.db".to_string()
}

fn default_access_secret() -> String {
    "change-me-access-secret".to_string()
}

fn default_refresh_secret() -> String {
    "change-me-refresh-secret".to_string()
}

fn default_access_ttl_minutes() -> i64 {
    15
}

fn default_refresh_ttl_days() -> i64 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        // Check if config file exists
        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.warn_on_defaults();

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Flag placeholder secrets so they never reach production unnoticed
    fn warn_on_defaults(&self) {
        if self.auth.access_token_secret == default_access_secret()
            || self.auth.refresh_token_secret == default_refresh_secret()
        {
            warn!("Using a default token secret; set [auth] secrets before deploying");
        }
        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            warn!("Access and refresh secrets are identical; configure distinct secrets");
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: default_bind_address(),
                port: default_port(),
            },
            database: DatabaseConfig {
                path: default_db_path(),
            },
            auth: AuthConfig {
                access_token_secret: default_access_secret(),
                access_token_ttl_minutes: default_access_ttl_minutes(),
                refresh_token_secret: default_refresh_secret(),
                refresh_token_ttl_days: default_refresh_ttl_days(),
            },
            logging: LoggingConfig::default(),
        }
    }
}
