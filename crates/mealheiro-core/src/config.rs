//! Application configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a three-layer resolution:
//! 1. Explicit path (e.g. `--config`)
//! 2. Override in data dir (~/.local/share/mealheiro/config.toml)
//! 3. Embedded defaults (compiled into binary)
//!
//! Keys missing from a file fall back to the defaults. The store location can
//! additionally be overridden with the `MEALHEIRO_DB` environment variable.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::NewUser;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/mealheiro.toml");

/// Environment variable overriding the store location
pub const DB_PATH_ENV: &str = "MEALHEIRO_DB";

/// File name of the store inside the data directory
pub const DB_FILE_NAME: &str = "mealheiro.db";

/// Store and pool settings
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub pool_size: u32,
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: 10,
            connection_timeout_secs: 5,
        }
    }
}

/// The account created when the store has no users
#[derive(Debug, Clone, PartialEq)]
pub struct SeedUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl Default for SeedUser {
    fn default() -> Self {
        Self {
            username: "demo".to_string(),
            email: "demo@mealheiro.local".to_string(),
            password: "demo123".to_string(),
            full_name: Some("Utilizador Demo".to_string()),
        }
    }
}

impl SeedUser {
    pub fn to_new_user(&self) -> NewUser {
        NewUser {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

/// Dashboard sizing
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub recent_limit: usize,
    pub upcoming_days: i64,
    pub trend_months: u32,
    pub top_categories: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_limit: 5,
            upcoming_days: 30,
            trend_months: 6,
            top_categories: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub database: DatabaseConfig,
    pub seed_user: SeedUser,
    pub dashboard: DashboardConfig,
    /// File the config was read from, `None` for embedded defaults
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load configuration (explicit path, then data dir override, then defaults)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let candidate = match override_path {
            Some(path) => {
                if !path.exists() {
                    warn!(path = %path.display(), "Config file not found, using defaults");
                }
                Some(path.to_path_buf())
            }
            None => default_config_path(),
        };

        match candidate {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                let mut config = Self::from_toml(&content)?;
                debug!(path = %path.display(), "Loaded config");
                config.source = Some(path);
                Ok(config)
            }
            _ => Self::from_toml(DEFAULT_CONFIG),
        }
    }

    /// Parse config from TOML content, filling gaps with defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Config::default();

        if let Some(db) = raw.database {
            config.database.path = db.path;
            if let Some(size) = db.pool_size {
                if size == 0 {
                    return Err(Error::Config("database.pool_size must be at least 1".into()));
                }
                config.database.pool_size = size;
            }
            if let Some(timeout) = db.connection_timeout_secs {
                config.database.connection_timeout_secs = timeout;
            }
        }

        if let Some(seed) = raw.seed_user {
            if let Some(username) = seed.username {
                config.seed_user.username = username;
            }
            if let Some(email) = seed.email {
                config.seed_user.email = email;
            }
            if let Some(password) = seed.password {
                config.seed_user.password = password;
            }
            if seed.full_name.is_some() {
                config.seed_user.full_name = seed.full_name;
            }
            config
                .seed_user
                .to_new_user()
                .validate()
                .map_err(|e| Error::Config(format!("Invalid [seed_user]: {}", e)))?;
        }

        if let Some(dash) = raw.dashboard {
            if let Some(limit) = dash.recent_limit {
                config.dashboard.recent_limit = limit;
            }
            if let Some(days) = dash.upcoming_days {
                config.dashboard.upcoming_days = days;
            }
            if let Some(months) = dash.trend_months {
                config.dashboard.trend_months = months.max(1);
            }
            if let Some(top) = dash.top_categories {
                config.dashboard.top_categories = top;
            }
        }

        Ok(config)
    }

    /// Resolve the store location: `MEALHEIRO_DB`, then config, then data dir
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }
        default_data_dir()
            .map(|dir| dir.join(DB_FILE_NAME))
            .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))
    }
}

/// Per-user data directory (~/.local/share/mealheiro on Linux)
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("mealheiro"))
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    default_data_dir().map(|d| d.join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    database: Option<RawDatabase>,
    seed_user: Option<RawSeedUser>,
    dashboard: Option<RawDashboard>,
}

#[derive(Debug, Deserialize)]
struct RawDatabase {
    path: Option<PathBuf>,
    pool_size: Option<u32>,
    connection_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawSeedUser {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDashboard {
    recent_limit: Option<usize>,
    upcoming_days: Option<i64>,
    trend_months: Option<u32>,
    top_categories: Option<usize>,
}
