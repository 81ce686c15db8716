//! Byte positions recorded by one body parse.
//!
//! Offsets can only be built by the parser and carry the path and length
//! of the file they were read from. The patch writer refuses to use them
//! against a file that no longer has that length.

use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IronmanOffset(pub(crate) u64);

impl IronmanOffset {
    pub fn position(&self) -> u64 {
        self.0
    }
}

/// Start of the resource array's count prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourcesOffset {
    pub(crate) position: u64,
    pub(crate) count: i32,
}

impl ResourcesOffset {
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Element count seen on disk when the offset was recorded.
    pub fn count(&self) -> i32 {
        self.count
    }
}

/// Start of the planet section, before the RNG prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanetSectionOffset(pub(crate) u64);

impl PlanetSectionOffset {
    pub fn position(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodyOffsets {
    pub(crate) path: PathBuf,
    pub(crate) file_len: u64,
    pub(crate) ironman: IronmanOffset,
    pub(crate) resources: ResourcesOffset,
    pub(crate) planets: Option<PlanetSectionOffset>,
}

impl BodyOffsets {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    pub fn ironman(&self) -> IronmanOffset {
        self.ironman
    }

    pub fn resources(&self) -> ResourcesOffset {
        self.resources
    }

    /// `None` when the planet section was never reached.
    pub fn planets(&self) -> Option<PlanetSectionOffset> {
        self.planets
    }
}
