//! Optional TOML configuration for the CLI.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use campaign_core::CodecOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub codec: CodecOptions,
}

impl Config {
    /// `<config_dir>/campaign-se/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("campaign-se");
        Ok(dir.join("config.toml"))
    }

    /// Load `explicit` if given, otherwise the default file if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file {} does not exist", path.display());
                }
                path.to_path_buf()
            }
            None => match Self::default_path() {
                Ok(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}
