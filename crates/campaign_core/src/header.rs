use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::backup;
use crate::error::{HeaderDecodeError, WriteError};
use crate::reader::LittleEndianReader;
use crate::timestamp;
use crate::version::FormatPolicy;
use crate::writer::LittleEndianWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SaveStateKind {
    Strategy,
    Battle,
    PostBattle,
    Unknown(i32),
}

impl SaveStateKind {
    pub const STRATEGY_RAW: i32 = 0;
    pub const BATTLE_RAW: i32 = 1;
    pub const POST_BATTLE_RAW: i32 = 2;

    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::STRATEGY_RAW => Self::Strategy,
            Self::BATTLE_RAW => Self::Battle,
            Self::POST_BATTLE_RAW => Self::PostBattle,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> i32 {
        match *self {
            Self::Strategy => Self::STRATEGY_RAW,
            Self::Battle => Self::BATTLE_RAW,
            Self::PostBattle => Self::POST_BATTLE_RAW,
            Self::Unknown(other) => other,
        }
    }
}

impl fmt::Display for SaveStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Strategy => f.write_str("Strategy"),
            Self::Battle => f.write_str("Battle"),
            Self::PostBattle => f.write_str("PostBattle"),
            Self::Unknown(v) => write!(f, "Unknown ({v})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveHeader {
    /// File this header was read from; `body_offset` is only meaningful there.
    pub path: PathBuf,
    pub version: i32,
    pub state: SaveStateKind,
    pub timestamp_ticks: i64,
    pub planet_name: String,
    pub operation_name: String,
    pub completed_missions: i32,
    pub operation_length: i32,
    pub difficulty: String,
    /// Present on disk only when the version carries strategy configs.
    pub strategy_config_name: Option<String>,
    pub play_time_seconds: f64,
    pub save_name: String,
    pub body_offset: u64,
}

fn field<T>(name: &'static str, result: io::Result<T>) -> Result<T, HeaderDecodeError> {
    result.map_err(|e| HeaderDecodeError::from_field(name, e))
}

impl SaveHeader {
    pub fn read<R: Read + Seek>(
        r: &mut LittleEndianReader<R>,
        path: &Path,
    ) -> Result<Self, HeaderDecodeError> {
        let version = field("version", r.read_i32())?;
        let state = SaveStateKind::from_raw(field("save_state", r.read_i32())?);
        let timestamp_ticks = field("timestamp", r.read_i64())?;
        let planet_name = field("planet_name", r.read_string())?;
        let operation_name = field("operation_name", r.read_string())?;
        let completed_missions = field("completed_missions", r.read_i32())?;
        let operation_length = field("operation_length", r.read_i32())?;
        let difficulty = field("difficulty", r.read_string())?;

        let strategy_config_name = if FormatPolicy::for_version(version).header_has_strategy_config()
        {
            Some(field("strategy_config_name", r.read_string())?)
        } else {
            None
        };

        let play_time_seconds = field("play_time", r.read_f64())?;
        let save_name = field("save_name", r.read_string())?;
        let body_offset = field("body_offset", r.position())?;

        Ok(Self {
            path: path.to_path_buf(),
            version,
            state,
            timestamp_ticks,
            planet_name,
            operation_name,
            completed_missions,
            operation_length,
            difficulty,
            strategy_config_name,
            play_time_seconds,
            save_name,
            body_offset,
        })
    }

    /// Serialize the header fields only.
    pub fn encode(&self) -> io::Result<Vec<u8>> {
        let mut w = LittleEndianWriter::new(Cursor::new(Vec::new()));
        w.write_i32(self.version)?;
        w.write_i32(self.state.raw())?;
        w.write_i64(self.timestamp_ticks)?;
        w.write_string(&self.planet_name)?;
        w.write_string(&self.operation_name)?;
        w.write_i32(self.completed_missions)?;
        w.write_i32(self.operation_length)?;
        w.write_string(&self.difficulty)?;
        if FormatPolicy::for_version(self.version).header_has_strategy_config() {
            w.write_string(self.strategy_config_name.as_deref().unwrap_or_default())?;
        }
        w.write_f64(self.play_time_seconds)?;
        w.write_string(&self.save_name)?;
        Ok(w.into_inner().into_inner())
    }

    pub fn policy(&self) -> FormatPolicy {
        FormatPolicy::for_version(self.version)
    }

    pub fn saved_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        timestamp::ticks_to_datetime(self.timestamp_ticks)
    }
}

pub fn parse_header(path: &Path) -> Result<SaveHeader, HeaderDecodeError> {
    let file = File::open(path).map_err(|source| HeaderDecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut r = LittleEndianReader::new(BufReader::new(file));
    let header = SaveHeader::read(&mut r, path)?;
    debug!(
        path = %path.display(),
        version = header.version,
        body_offset = header.body_offset,
        "parsed save header"
    );
    Ok(header)
}

/// Rewrite the header of `path`, keeping every body byte as it is.
///
/// The body start is re-read from `path` itself; the header's own
/// `body_offset` is replaced with the new one once the write lands.
pub fn write_header(header: &mut SaveHeader, path: &Path) -> Result<(), WriteError> {
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let original = fs::read(path).map_err(io_err)?;
    let mut r = LittleEndianReader::new(Cursor::new(original.as_slice()));
    let on_disk = SaveHeader::read(&mut r, path)
        .map_err(|e| io_err(io::Error::new(io::ErrorKind::InvalidData, e.to_string())))?;
    let old_body_offset = on_disk.body_offset as usize;

    let encoded = header.encode().map_err(WriteError::Encode)?;

    backup::create_verified_backup(path)?;

    let mut out = Vec::with_capacity(encoded.len() + original.len() - old_body_offset);
    out.extend_from_slice(&encoded);
    out.extend_from_slice(&original[old_body_offset..]);
    fs::write(path, &out).map_err(io_err)?;

    let new_body_offset = encoded.len() as u64;
    if new_body_offset != on_disk.body_offset {
        info!(
            path = %path.display(),
            old = on_disk.body_offset,
            new = new_body_offset,
            "header length changed; body moved"
        );
    }
    header.body_offset = new_body_offset;
    header.path = path.to_path_buf();
    Ok(())
}
