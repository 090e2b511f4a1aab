use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::device;

const DEFAULT_PORT: u16 = 1338;
const DEFAULT_NOTIFY_INTERVAL_SECS: u64 = 30;

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub name: Option<String>,
    pub notify_interval_secs: Option<u64>,
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub name: String,
    pub path: PathBuf,
    pub notify_interval: Duration,
}

impl Config {
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Self {
        let file = file.unwrap_or_default();
        Config {
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            name: args
                .name
                .clone()
                .or(file.name)
                .unwrap_or_else(device::default_friendly_name),
            path: args.path.clone(),
            notify_interval: Duration::from_secs(
                file.notify_interval_secs
                    .unwrap_or(DEFAULT_NOTIFY_INTERVAL_SECS)
                    .max(1),
            ),
        }
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("dircast.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("dircast").join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}
