use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Pipeline settings read from the optional TOML file.
///
/// Database credentials are not part of this file; see [`DatabaseConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub load: LoadConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_labels_dir")]
    pub labels_dir: PathBuf,

    #[serde(default = "default_result_path")]
    pub output_path: PathBuf,

    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Timestamp of the first accepted record; later records follow at one-second steps.
    #[serde(default = "default_base_time")]
    pub base_time: NaiveDateTime,

    /// Fixed RNG seed for reproducible runs. Unset means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_labels_dir() -> PathBuf {
    PathBuf::from("data/labels")
}

fn default_result_path() -> PathBuf {
    PathBuf::from("data/affectnet_processed_results.csv")
}

fn default_max_files() -> usize {
    5000
}

fn default_base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            labels_dir: default_labels_dir(),
            output_path: default_result_path(),
            max_files: default_max_files(),
            base_time: default_base_time(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default = "default_result_path")]
    pub input_path: PathBuf,

    #[serde(default = "default_staging_table")]
    pub staging_table: String,
}

fn default_staging_table() -> String {
    "stg_affectnet_raw".to_string()
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            input_path: default_result_path(),
            staging_table: default_staging_table(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_row_limit")]
    pub row_limit: usize,
}

fn default_row_limit() -> usize {
    1000
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            row_limit: default_row_limit(),
        }
    }
}

impl Config {
    /// Load settings from the default location, falling back to defaults when
    /// no file exists there.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load settings from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PipelineError::Configuration(format!("invalid settings file: {}", e)))
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("emolens")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Connection settings for the relational store, taken from the environment.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Postgres(PostgresConfig),
    Sqlite { path: PathBuf },
}

#[derive(Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub dbname: String,
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .finish()
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseConfig::Postgres(pg) => pg.fmt(f),
            DatabaseConfig::Sqlite { path } => f.debug_struct("Sqlite").field("path", path).finish(),
        }
    }
}

const REQUIRED_PG_VARS: [&str; 5] = ["DB_USER", "DB_PASSWORD", "DB_HOST", "DB_PORT", "DB_NAME"];

impl DatabaseConfig {
    /// Read the database settings from the process environment.
    ///
    /// | Env Var          | Meaning                                   |
    /// |------------------|-------------------------------------------|
    /// | `DB_BACKEND`     | `postgres` (default) or `sqlite`          |
    /// | `DB_USER`        | PostgreSQL user (required for postgres)   |
    /// | `DB_PASSWORD`    | PostgreSQL password (required)            |
    /// | `DB_HOST`        | PostgreSQL host (required)                |
    /// | `DB_PORT`        | PostgreSQL port (required, numeric)       |
    /// | `DB_NAME`        | PostgreSQL database (required)            |
    /// | `DB_SQLITE_PATH` | database file for the sqlite backend      |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DatabaseConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = get("DB_BACKEND").unwrap_or_else(|| "postgres".to_string());
        match backend.to_ascii_lowercase().as_str() {
            "sqlite" => {
                let path = get("DB_SQLITE_PATH").ok_or_else(|| {
                    PipelineError::Configuration(
                        "DB_SQLITE_PATH is required when DB_BACKEND=sqlite".to_string(),
                    )
                })?;
                Ok(DatabaseConfig::Sqlite { path: PathBuf::from(path) })
            }
            "postgres" | "postgresql" => {
                let missing: Vec<&str> = REQUIRED_PG_VARS
                    .iter()
                    .copied()
                    .filter(|key| get(*key).is_none())
                    .collect();
                if !missing.is_empty() {
                    return Err(PipelineError::Configuration(format!(
                        "missing environment variables: {}",
                        missing.join(", ")
                    )));
                }

                let port_raw = get("DB_PORT").unwrap_or_default();
                let port = port_raw.trim().parse::<u16>().map_err(|_| {
                    PipelineError::Configuration(format!("DB_PORT is not a valid port: {}", port_raw))
                })?;

                Ok(DatabaseConfig::Postgres(PostgresConfig {
                    user: get("DB_USER").unwrap_or_default(),
                    password: get("DB_PASSWORD").unwrap_or_default(),
                    host: get("DB_HOST").unwrap_or_default(),
                    port,
                    dbname: get("DB_NAME").unwrap_or_default(),
                }))
            }
            other => Err(PipelineError::Configuration(format!(
                "unknown DB_BACKEND: {}",
                other
            ))),
        }
    }

    /// Human-readable target for log lines. Never includes the password.
    pub fn describe(&self) -> String {
        match self {
            DatabaseConfig::Postgres(pg) => {
                format!("postgresql://{}@{}:{}/{}", pg.user, pg.host, pg.port, pg.dbname)
            }
            DatabaseConfig::Sqlite { path } => format!("sqlite://{}", path.display()),
        }
    }
}
