//! Backup-first discipline for every write.
//!
//! A `<name>.save.bak` copy is written and checked against the original
//! before the primary file is touched.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::WriteError;

pub const BACKUP_SUFFIX: &str = ".bak";

/// `foo.save` -> `foo.save.bak`
pub fn backup_path(save_path: &Path) -> PathBuf {
    let mut name = OsString::from(save_path.as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

fn digest(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}

/// Copy `save_path` to its backup path and confirm the copy is identical.
pub fn create_verified_backup(save_path: &Path) -> Result<PathBuf, WriteError> {
    let backup = backup_path(save_path);
    let backup_err = |source| WriteError::Backup {
        path: backup.clone(),
        source,
    };

    let original = fs::read(save_path).map_err(|source| WriteError::Io {
        path: save_path.to_path_buf(),
        source,
    })?;
    fs::write(&backup, &original).map_err(backup_err)?;

    let written = fs::read(&backup).map_err(backup_err)?;
    if written.len() != original.len() {
        return Err(WriteError::BackupVerification {
            path: backup,
            detail: format!(
                "length {} differs from original {}",
                written.len(),
                original.len()
            ),
        });
    }
    if digest(&written) != digest(&original) {
        return Err(WriteError::BackupVerification {
            path: backup,
            detail: "content digest differs from original".to_string(),
        });
    }

    info!(backup = %backup.display(), bytes = original.len(), "backup written");
    Ok(backup)
}

/// Put the backup back in place of the primary file.
pub fn restore_from_backup(save_path: &Path) -> Result<(), WriteError> {
    let backup = backup_path(save_path);
    if !backup.exists() {
        return Err(WriteError::Backup {
            path: backup,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no backup to restore"),
        });
    }
    fs::copy(&backup, save_path).map_err(|source| WriteError::Io {
        path: save_path.to_path_buf(),
        source,
    })?;
    warn!(save = %save_path.display(), "primary save restored from backup");
    Ok(())
}
