//! Loads a [`GotexConfig`] from an explicit `--config` path, as opposed to
//! the default `~/.config/gotex/config.toml` lookup `GotexConfig` does on
//! its own.

use std::{fs, io, path::Path};

use gotex::config::GotexConfig;

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "I/O error: {err}"),
            ConfigError::Parse(err) => write!(f, "TOML parsing error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

pub fn load_config_file(path: &Path) -> Result<GotexConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GotexConfig = toml::from_str(&content)?;
    Ok(config)
}
