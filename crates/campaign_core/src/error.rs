use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::body::BodySection;
use crate::resync::Anchor;

#[derive(Debug, Error)]
pub enum HeaderDecodeError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("header ended unexpectedly while reading {field}")]
    Truncated { field: &'static str },
    #[error("header field {field} is malformed: {source}")]
    Malformed {
        field: &'static str,
        #[source]
        source: io::Error,
    },
}

impl HeaderDecodeError {
    pub(crate) fn from_field(field: &'static str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated { field }
        } else {
            Self::Malformed { field, source }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnsupportedVersion {
    #[error("save format version {version} is not supported (oldest supported body format is {minimum})")]
    TooOld { version: i32, minimum: i32 },
    #[error("save format version {version} is newer than this decoder (newest known body format is {maximum})")]
    TooNew { version: i32, maximum: i32 },
}

#[derive(Debug, Error)]
#[error("essential body field {field} unreadable at offset {offset}: {source}")]
pub struct EssentialBodyDecodeError {
    pub field: &'static str,
    pub offset: u64,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Error)]
pub enum BodyError {
    #[error(transparent)]
    Unsupported(#[from] UnsupportedVersion),
    #[error("failed to open {} for body decode: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Essential(#[from] EssentialBodyDecodeError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no {anchor} signature found within {scanned} bytes after offset {start}")]
pub struct ResyncFailure {
    pub anchor: Anchor,
    pub start: u64,
    pub scanned: u64,
}

#[derive(Debug, Error)]
pub enum ExtendedFailureReason {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("implausible count {count} (limit {limit})")]
    ImplausibleCount { count: i32, limit: i32 },
    #[error(transparent)]
    Resync(#[from] ResyncFailure),
}

/// Extended decode stopped; everything decoded before `offset` is kept.
#[derive(Debug, Error)]
#[error("extended body decode stopped in {section} at offset {offset}: {reason}")]
pub struct ExtendedBodyFailure {
    pub section: BodySection,
    pub offset: u64,
    #[source]
    pub reason: ExtendedFailureReason,
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write backup {}: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("backup {} does not match the original ({detail})", path.display())]
    BackupVerification { path: PathBuf, detail: String },
    #[error("I/O error writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("save body is not available for patching: {0}")]
    BodyUnavailable(String),
    #[error(
        "offsets are stale: {} was {expected_len} bytes when parsed, now {actual_len}",
        path.display()
    )]
    StaleOffsets {
        path: PathBuf,
        expected_len: u64,
        actual_len: u64,
    },
    #[error("resource array length changed on disk: parsed {expected}, found {found}")]
    ResourceCountMismatch { expected: i32, found: i32 },
    #[error("resource array cannot change length in place: parsed {original}, edited {edited}")]
    ResourceLengthChanged { original: usize, edited: usize },
    #[error("byte at ironman offset {offset} is {found:#04x}, expected a boolean")]
    IronmanByteInvalid { offset: u64, found: u8 },
    #[error("planet {index} template on disk is {found:?}, expected {expected:?}")]
    PlanetTemplateMismatch {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("{field} index {index} is out of range ({len} present)")]
    FieldOutOfRange {
        field: &'static str,
        index: usize,
        len: usize,
    },
    #[error("failed to encode header: {0}")]
    Encode(#[source] io::Error),
    #[error("file changed but could not be re-read: {0}")]
    Reparse(#[source] HeaderDecodeError),
}
