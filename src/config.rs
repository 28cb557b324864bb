//! Configuration loading with env-var overrides.
//!
//! Reads a TOML file (explicit path, then `config/default.toml`, then
//! hardcoded defaults) and applies `SYMCALC_BIND`, `SYMCALC_DB_PATH`, and
//! `SYMCALC_LOG_LEVEL` env overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES};
use crate::error::AppError;

/// Default per-request computation deadline, in seconds. Symbolic work is
/// input-controlled and can run long; the bound keeps a single request from
/// pinning a blocking worker indefinitely.
const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Socket address the API listener binds to.
    pub bind: String,
    /// Path of the SQLite history database.
    pub db_path: PathBuf,
    pub log_level: String,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum expression nesting depth accepted by the engine.
    pub max_depth: usize,
    /// Maximum expression node count accepted by the engine.
    pub max_nodes: usize,
    /// Per-request computation deadline in seconds.
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1:8080".to_string(),
            db_path: PathBuf::from("calculations.db"),
            log_level: "info".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

/// Load config from the given path, or `config/default.toml`, then apply
/// env-var overrides. If no path is given and `config/default.toml` does not
/// exist, the hardcoded defaults are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let mut config = match config_path {
        Some(path) => load_from(Path::new(path))?,
        None => {
            let default_path = Path::new("config/default.toml");
            if default_path.exists() {
                load_from(default_path)?
            } else {
                Config::default()
            }
        }
    };

    if let Ok(bind) = env::var("SYMCALC_BIND") {
        config.bind = bind;
    }
    if let Ok(db_path) = env::var("SYMCALC_DB_PATH") {
        config.db_path = PathBuf::from(db_path);
    }
    if let Ok(level) = env::var("SYMCALC_LOG_LEVEL") {
        config.log_level = level;
    }

    Ok(config)
}

fn load_from(path: &Path) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))
}
