// ⚙️ Configuration - TOML file with built-in defaults
//
// Lookup order for the database path:
//   1. PORT_OPS_DB environment variable
//   2. `database_path` in the config file
//   3. <data dir>/port-ops/port_ops.db

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DB_ENV_VAR: &str = "PORT_OPS_DB";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,

    /// Address the REST server binds to
    pub server_addr: String,

    /// Known port locations, in legend order
    pub locations: Vec<String>,

    /// Known equipment-tag prefixes, in legend order
    pub equipment_types: Vec<String>,

    /// How long a recorded operation stays editable
    pub edit_lock_hours: i64,

    /// Decimal places used when printing tonnage
    pub display_decimals: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: default_data_dir().join("port_ops.db"),
            server_addr: "0.0.0.0:3000".to_string(),
            locations: vec![
                "Berth 1".to_string(),
                "Berth 2".to_string(),
                "Berth 3".to_string(),
                "Yard".to_string(),
            ],
            equipment_types: vec![
                "EMP".to_string(), // forklift
                "GUI".to_string(), // crane
                "PC".to_string(),  // loader
                "CAM".to_string(), // truck
            ],
            edit_lock_hours: 24,
            display_decimals: 3,
        }
    }
}

impl AppConfig {
    /// Parse a config file; missing keys fall back to defaults
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: AppConfig =
            toml::from_str(&raw).with_context(|| format!("Invalid config file {:?}", path))?;
        Ok(config)
    }

    /// Load `path` (or the default location) if it exists, otherwise defaults,
    /// then apply the environment override
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

        let mut config = if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::load(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            AppConfig::default()
        };

        if let Ok(db) = std::env::var(DB_ENV_VAR) {
            if !db.trim().is_empty() {
                config.database_path = PathBuf::from(db);
            }
        }

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir {:?}", parent))?;
        }
        let raw = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, raw).with_context(|| format!("Failed to write config file {:?}", path))?;
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("port-ops")
        .join("config.toml")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("port-ops")
}
