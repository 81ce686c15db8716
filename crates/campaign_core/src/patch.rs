//! Surgical in-place writes of edited body fields.
//!
//! Every patch is planned against an in-memory copy of the file first, so
//! a validation failure never leaves the primary file half written. Only
//! once the whole plan checks out is the backup taken and the bytes
//! overwritten at their recorded offsets.

use std::fs::{self, OpenOptions};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::backup;
use crate::body::SaveBody;
use crate::entities::PLANET_RNG_WORDS;
use crate::error::WriteError;
use crate::header::SaveHeader;
use crate::reader::LittleEndianReader;
use crate::writer::LittleEndianWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatchedField {
    Ironman,
    Resources,
    PlanetControl { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatchedRange {
    pub field: PatchedField,
    pub offset: u64,
    pub len: u64,
}

impl PatchedRange {
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanetCountMismatch {
    pub on_disk: usize,
    pub in_memory: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub backup: PathBuf,
    pub ranges: Vec<PatchedRange>,
    /// Set when the planet lists disagreed; the shorter length was patched.
    pub planet_count_mismatch: Option<PlanetCountMismatch>,
}

struct Patch {
    range: PatchedRange,
    bytes: Vec<u8>,
}

type Buffer = LittleEndianWriter<Cursor<Vec<u8>>>;

fn encode(f: impl FnOnce(&mut Buffer) -> io::Result<()>) -> Result<Vec<u8>, WriteError> {
    let mut w = LittleEndianWriter::new(Cursor::new(Vec::new()));
    f(&mut w).map_err(WriteError::Encode)?;
    Ok(w.into_inner().into_inner())
}

fn patch(field: PatchedField, offset: u64, bytes: Vec<u8>) -> Patch {
    Patch {
        range: PatchedRange {
            field,
            offset,
            len: bytes.len() as u64,
        },
        bytes,
    }
}

/// Write the ironman flag, resources and planet control values of `body`
/// back into the file it was parsed from.
pub fn write_body_changes(
    header: &SaveHeader,
    body: &SaveBody,
) -> Result<PatchReport, WriteError> {
    let path = body.offsets.path();
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let original = fs::read(path).map_err(io_err)?;
    let actual_len = original.len() as u64;
    if actual_len != body.offsets.file_len() {
        return Err(WriteError::StaleOffsets {
            path: path.to_path_buf(),
            expected_len: body.offsets.file_len(),
            actual_len,
        });
    }

    let mut report_mismatch = None;
    let patches = plan(header, body, &original, &mut report_mismatch)?;

    let backup_path = backup::create_verified_backup(path)?;
    apply(path, &patches).map_err(io_err)?;

    info!(
        path = %path.display(),
        patches = patches.len(),
        "body changes written"
    );
    Ok(PatchReport {
        backup: backup_path,
        ranges: patches.into_iter().map(|p| p.range).collect(),
        planet_count_mismatch: report_mismatch,
    })
}

fn plan(
    header: &SaveHeader,
    body: &SaveBody,
    original: &[u8],
    mismatch: &mut Option<PlanetCountMismatch>,
) -> Result<Vec<Patch>, WriteError> {
    let path = body.offsets.path();
    let read_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut r = LittleEndianReader::new(Cursor::new(original));
    let mut patches = Vec::new();

    // Ironman flag
    let ironman_at = body.offsets.ironman().position();
    r.seek_to(ironman_at).map_err(read_err)?;
    let found = r.read_u8().map_err(read_err)?;
    if found > 1 {
        return Err(WriteError::IronmanByteInvalid {
            offset: ironman_at,
            found,
        });
    }
    let bytes = encode(|w| w.write_bool(body.ironman))?;
    patches.push(patch(PatchedField::Ironman, ironman_at, bytes));

    // Resources
    let resources = body.offsets.resources();
    let original_count = resources.count() as usize;
    if body.resources.len() != original_count {
        return Err(WriteError::ResourceLengthChanged {
            original: original_count,
            edited: body.resources.len(),
        });
    }
    r.seek_to(resources.position()).map_err(read_err)?;
    let on_disk = r.read_i32().map_err(read_err)?;
    if on_disk != resources.count() {
        return Err(WriteError::ResourceCountMismatch {
            expected: resources.count(),
            found: on_disk,
        });
    }
    let bytes = encode(|w| {
        w.write_i32(resources.count())?;
        for &value in &body.resources {
            w.write_i32(value)?;
        }
        Ok(())
    })?;
    patches.push(patch(PatchedField::Resources, resources.position(), bytes));

    // Planet control pairs
    let Some(planets) = body.offsets.planets() else {
        return Ok(patches);
    };
    if body.planets.is_empty() {
        return Ok(patches);
    }
    let template_ref = header.policy().template_ref;
    r.seek_to(planets.position() + (PLANET_RNG_WORDS * 4) as u64)
        .map_err(read_err)?;
    let disk_count = r.read_i32().map_err(read_err)?.max(0) as usize;
    if disk_count != body.planets.len() {
        warn!(
            path = %path.display(),
            on_disk = disk_count,
            in_memory = body.planets.len(),
            "planet count mismatch; patching the shorter list"
        );
        *mismatch = Some(PlanetCountMismatch {
            on_disk: disk_count,
            in_memory: body.planets.len(),
        });
    }

    for (index, planet) in body
        .planets
        .iter()
        .enumerate()
        .take(disk_count.min(body.planets.len()))
    {
        let found = template_ref.read(&mut r).map_err(read_err)?;
        if found != planet.template {
            return Err(WriteError::PlanetTemplateMismatch {
                index,
                expected: planet.template.clone(),
                found,
            });
        }
        let control_at = r.position().map_err(read_err)?;
        let bytes = encode(|w| {
            w.write_i32(planet.control)?;
            w.write_i32(planet.control_change)
        })?;
        patches.push(patch(PatchedField::PlanetControl { index }, control_at, bytes));
        r.skip(8).map_err(read_err)?;
    }

    Ok(patches)
}

fn apply(path: &Path, patches: &[Patch]) -> io::Result<()> {
    let file = OpenOptions::new().write(true).open(path)?;
    let mut w = LittleEndianWriter::new(file);
    for p in patches {
        w.seek_to(p.range.offset)?;
        w.write_bytes(&p.bytes)?;
    }
    w.flush()?;
    w.into_inner().sync_all()
}
