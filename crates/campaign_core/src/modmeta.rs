use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MODMETA_SUFFIX: &str = ".modmeta";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Mods that were active when a save was written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModMetadata {
    #[serde(default)]
    pub game_version: Option<String>,
    #[serde(default)]
    pub mods: Vec<ModEntry>,
}

#[derive(Debug, Error)]
pub enum ModMetaError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not valid mod metadata: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// `foo.save` -> `foo.save.modmeta`
pub fn modmeta_path(save_path: &Path) -> PathBuf {
    let mut name = OsString::from(save_path.as_os_str());
    name.push(MODMETA_SUFFIX);
    PathBuf::from(name)
}

/// Read the sidecar next to `save_path`; `Ok(None)` when there is none.
pub fn read_mod_metadata(save_path: &Path) -> Result<Option<ModMetadata>, ModMetaError> {
    let path = modmeta_path(save_path);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ModMetaError::Io { path, source }),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| ModMetaError::Json { path, source })
}
