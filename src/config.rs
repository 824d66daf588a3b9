use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::transform::TransformKind;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// `text` or `json`
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

/// Deployment variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One slot per id; `GET /` lists ids
    #[default]
    Keyed,
    /// Append-only list; `GET /` pages through it
    Ranged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyedDriver {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RangedDriver {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    pub keyed_driver: KeyedDriver,
    /// Directory for `<id>.json` files
    pub directory: PathBuf,
    pub ranged_driver: RangedDriver,
    pub database_url: String,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Keyed,
            keyed_driver: KeyedDriver::File,
            directory: PathBuf::from("parsed"),
            ranged_driver: RangedDriver::Sqlite,
            database_url: "sqlite:./data/logs.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max background jobs running at once
    pub workers: usize,
    pub transform: TransformKind,
    pub transform_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 16,
            transform: TransformKind::None,
            transform_delay_ms: 0,
        }
    }
}

/// Load configuration from an optional TOML file overlaid with
/// `PERFLOG__SECTION__KEY` environment variables
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("PERFLOG").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        anyhow::bail!("server.port must be non-zero");
    }

    if !matches!(cfg.server.log_format.as_str(), "text" | "json") {
        anyhow::bail!(
            "server.log_format must be 'text' or 'json', got '{}'",
            cfg.server.log_format
        );
    }

    if cfg.pipeline.workers == 0 {
        anyhow::bail!("pipeline.workers must be at least 1");
    }

    match cfg.storage.backend {
        BackendKind::Keyed => {
            if cfg.storage.keyed_driver == KeyedDriver::File
                && cfg.storage.directory.as_os_str().is_empty()
            {
                anyhow::bail!("storage.directory cannot be empty for the file driver");
            }
        }
        BackendKind::Ranged => {
            if cfg.storage.ranged_driver == RangedDriver::Sqlite {
                if cfg.storage.database_url.is_empty() {
                    anyhow::bail!("storage.database_url cannot be empty for the sqlite driver");
                }
                if cfg.storage.max_connections == 0 {
                    anyhow::bail!("storage.max_connections must be at least 1");
                }
            }
        }
    }

    Ok(())
}
