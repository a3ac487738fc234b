// Configuration loaded from YAML

use crate::models::{DEFAULT_CATEGORIES, DEFAULT_CATEGORY, Priority};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "todostore";
const CONFIG_FILE: &str = "todostore.yml";
const DATA_FILE: &str = "tasks.json";

/// User configuration. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backing task file
    pub data_file: PathBuf,
    /// Category suggestions offered for new tasks
    pub categories: Vec<String>,
    pub default_priority: Priority,
    pub default_category: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            default_priority: Priority::Medium,
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the platform config dir when `path` is None.
    ///
    /// An explicit path must exist; the default location may be absent, in
    /// which case defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_file(p),
            None => match default_config_file() {
                Some(p) if p.exists() => Self::load_file(&p),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).context(format!("Failed to parse config file {}", path.display()))?;

        debug!(file = ?path, data_file = ?config.data_file, "Loaded config");
        Ok(config)
    }
}

/// `<config dir>/todostore/todostore.yml`
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}

/// `<data dir>/todostore/tasks.json`, or `./tasks.json` when the platform has no data dir
pub fn default_data_file() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_FILE)
}
