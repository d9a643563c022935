/*
 * Persisted defaults for a run: which extensions to select and how verbose to
 * log. Settings are stored as JSON, by default in `selection_config.json` in
 * the per-user configuration directory from `path_utils`. Command-line options
 * override whatever is stored.
 */
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "selection_config.json";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    NoProjectDirectory,
    Json(serde_json::Error),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::NoProjectDirectory => {
                write!(f, "Could not determine project directory for configuration")
            }
            ConfigError::Json(e) => write!(f, "Configuration file format error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::NoProjectDirectory => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/*
 * Missing fields take their defaults, so a config file written by an older
 * version still loads.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Comma-separated extensions; empty selects every file.
    pub extensions: String,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: Option<String>,
}

/// Reads a config from an explicit JSON file.
pub fn load_config_file(file_path: &Path) -> Result<SelectionConfig> {
    let reader = BufReader::new(File::open(file_path)?);
    let config = serde_json::from_reader(reader)?;
    log::debug!("Config: Loaded {config:?} from {file_path:?}");
    Ok(config)
}

pub fn save_config_file(file_path: &Path, config: &SelectionConfig) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(file_path)?);
    serde_json::to_writer_pretty(&mut writer, config)?;
    writer.flush()?;
    log::debug!("Config: Saved {config:?} to {file_path:?}");
    Ok(())
}

pub trait ConfigManagerOperations {
    /// `Ok(None)` when nothing has been saved yet.
    fn load_config(&self, app_name: &str) -> Result<Option<SelectionConfig>>;
    fn save_config(&self, app_name: &str, config: &SelectionConfig) -> Result<()>;
}

pub struct CoreConfigManager {}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager {}
    }

    fn config_file_path(app_name: &str) -> Result<PathBuf> {
        let config_dir = path_utils::get_base_app_config_local_dir(app_name)
            .ok_or(ConfigError::NoProjectDirectory)?;
        Ok(config_dir.join(CONFIG_FILENAME))
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    fn load_config(&self, app_name: &str) -> Result<Option<SelectionConfig>> {
        log::trace!("CoreConfigManager: Loading config for app '{app_name}'");
        let file_path = Self::config_file_path(app_name)?;
        if !file_path.exists() {
            log::debug!("CoreConfigManager: Config file {file_path:?} does not exist.");
            return Ok(None);
        }
        load_config_file(&file_path).map(Some)
    }

    fn save_config(&self, app_name: &str, config: &SelectionConfig) -> Result<()> {
        log::trace!("CoreConfigManager: Saving config for app '{app_name}'");
        let file_path = Self::config_file_path(app_name)?;
        save_config_file(&file_path, config)
    }
}
