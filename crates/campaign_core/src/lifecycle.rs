//! Whole-unit file operations.
//!
//! A save unit is the `.save` file plus whichever sidecars exist next to
//! it: same-basename `.jpg`/`.png` screenshots, the `.save.bak` backup and
//! the `.save.modmeta` mod list.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::backup::backup_path;
use crate::error::{HeaderDecodeError, WriteError};
use crate::header::{SaveHeader, parse_header, write_header};
use crate::modmeta::modmeta_path;
use crate::timestamp;

pub const SAVE_EXTENSION: &str = "save";
pub const SCREENSHOT_EXTENSIONS: [&str; 2] = ["jpg", "png"];

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a .save file", .0.display())]
    NotASave(PathBuf),
    #[error("{} already exists", .0.display())]
    DestinationExists(PathBuf),
    #[error(transparent)]
    Header(#[from] HeaderDecodeError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveUnit {
    pub save: PathBuf,
    /// Every screenshot present, in [`SCREENSHOT_EXTENSIONS`] order.
    pub screenshots: Vec<PathBuf>,
    pub backup: Option<PathBuf>,
    pub modmeta: Option<PathBuf>,
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

fn ensure_save_path(path: &Path) -> Result<(), LifecycleError> {
    let is_save = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SAVE_EXTENSION));
    if is_save {
        Ok(())
    } else {
        Err(LifecycleError::NotASave(path.to_path_buf()))
    }
}

impl SaveUnit {
    /// Collect the members present on disk for `save_path`.
    pub fn locate(save_path: &Path) -> Self {
        let screenshots = SCREENSHOT_EXTENSIONS
            .iter()
            .filter_map(|ext| existing(save_path.with_extension(ext)))
            .collect();
        Self {
            save: save_path.to_path_buf(),
            screenshots,
            backup: existing(backup_path(save_path)),
            modmeta: existing(modmeta_path(save_path)),
        }
    }

    /// Every member that exists, the save itself first.
    pub fn members(&self) -> Vec<&Path> {
        let mut out = Vec::with_capacity(3 + self.screenshots.len());
        if self.save.is_file() {
            out.push(self.save.as_path());
        }
        out.extend(self.screenshots.iter().map(PathBuf::as_path));
        out.extend(
            [&self.backup, &self.modmeta]
                .into_iter()
                .flatten()
                .map(PathBuf::as_path),
        );
        out
    }
}

/// Delete every present member of the unit; absent members are ignored.
pub fn delete_save(save_path: &Path) -> Result<Vec<PathBuf>, LifecycleError> {
    ensure_save_path(save_path)?;
    let unit = SaveUnit::locate(save_path);
    let mut removed = Vec::new();
    for member in unit.members() {
        match fs::remove_file(member) {
            Ok(()) => removed.push(member.to_path_buf()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(LifecycleError::Io {
                    path: member.to_path_buf(),
                    source,
                });
            }
        }
    }
    info!(save = %save_path.display(), removed = removed.len(), "save unit deleted");
    Ok(removed)
}

/// Copy the unit to `destination`, then give the copy a new display name
/// and the current time.
///
/// The source backup is not copied; rewriting the copy's header leaves a
/// backup of the copy in its place.
pub fn duplicate_save(
    source: &Path,
    destination: &Path,
    display_name: &str,
) -> Result<SaveHeader, LifecycleError> {
    ensure_save_path(source)?;
    ensure_save_path(destination)?;
    if destination.exists() {
        return Err(LifecycleError::DestinationExists(destination.to_path_buf()));
    }

    let unit = SaveUnit::locate(source);
    let mut copies = vec![(unit.save.clone(), destination.to_path_buf())];
    for shot in &unit.screenshots {
        let ext = shot.extension().unwrap_or_default();
        copies.push((shot.clone(), destination.with_extension(ext)));
    }
    if let Some(meta) = &unit.modmeta {
        copies.push((meta.clone(), modmeta_path(destination)));
    }

    for (from, to) in &copies {
        fs::copy(from, to).map_err(|source| LifecycleError::Io {
            path: to.clone(),
            source,
        })?;
        debug!(from = %from.display(), to = %to.display(), "copied unit member");
    }

    let mut header = parse_header(destination)?;
    header.save_name = display_name.to_string();
    header.timestamp_ticks = timestamp::now_ticks();
    write_header(&mut header, destination)?;
    info!(
        source = %source.display(),
        destination = %destination.display(),
        "save duplicated"
    );
    Ok(header)
}

/// Every `.save` unit directly inside `dir`, sorted by path.
pub fn list_saves(dir: &Path) -> Result<Vec<SaveUnit>, LifecycleError> {
    let io_err = |source| LifecycleError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut units = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && ensure_save_path(&path).is_ok() {
            units.push(SaveUnit::locate(&path));
        }
    }
    units.sort_by(|a, b| a.save.cmp(&b.save));
    Ok(units)
}
