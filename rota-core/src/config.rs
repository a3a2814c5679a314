//! Configuration management for rota
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (ROTA_*)
//! 3. Config file (~/.config/rota/config.toml)
//! 4. Default values

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Socket address string suitable for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// How many times to try the initial connection
    pub connect_attempts: u32,

    /// Pause between connection attempts
    #[serde(with = "humantime_serde")]
    pub connect_retry_delay: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rota")
            .join("rota.db");

        Self {
            path,
            max_connections: 5,
            connect_attempts: 3,
            connect_retry_delay: Duration::from_secs(1),
        }
    }
}

impl DatabaseConfig {
    /// Create a new database config with the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the maximum number of connections
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

/// Ordering applied between reviewer candidates with equal load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Whatever order the store produces
    Natural,
    /// Lowest user id first
    #[default]
    UserId,
    /// Highest user id first
    UserIdDesc,
}

impl TieBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreak::Natural => "natural",
            TieBreak::UserId => "user_id",
            TieBreak::UserIdDesc => "user_id_desc",
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TieBreak {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "natural" => Ok(TieBreak::Natural),
            "user_id" => Ok(TieBreak::UserId),
            "user_id_desc" => Ok(TieBreak::UserIdDesc),
            other => Err(Error::Config(format!("unknown tie_break: {}", other))),
        }
    }
}

/// Reviewer assignment settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AssignmentConfig {
    pub tie_break: TieBreak,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db_path: Option<PathBuf>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub assignment: AssignmentConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/rota/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rota").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - ROTA_HOST, ROTA_PORT: HTTP listener
    /// - ROTA_DB_PATH: SQLite database file
    /// - ROTA_MAX_CONNECTIONS: pool size
    /// - ROTA_TIE_BREAK: candidate ordering on equal load
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(host) = lookup("ROTA_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("ROTA_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid ROTA_PORT {}: {}", port, e)))?;
        }

        if let Some(path) = lookup("ROTA_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("ROTA_MAX_CONNECTIONS") {
            self.database.max_connections = max.parse().map_err(|e| {
                Error::Config(format!("Invalid ROTA_MAX_CONNECTIONS {}: {}", max, e))
            })?;
        }

        if let Some(tie_break) = lookup("ROTA_TIE_BREAK") {
            self.assignment.tie_break = tie_break.parse()?;
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }

        if let Some(port) = overrides.port {
            self.server.port = port;
        }

        if let Some(path) = overrides.db_path {
            self.database.path = path;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(config_path: Option<&Path>, overrides: CliOverrides) -> Result<Self> {
        let base = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        Ok(base.with_env_overrides()?.with_cli_overrides(overrides))
    }
}
