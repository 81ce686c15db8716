use std::path::{Path, PathBuf};

use tracing::debug;

use crate::body::{SaveBody, parse_body_with};
use crate::config::CodecOptions;
use crate::error::{BodyError, HeaderDecodeError, WriteError};
use crate::header::{SaveHeader, parse_header, write_header};
use crate::patch::{PatchReport, write_body_changes};

/// One edit session over a save file.
///
/// Committing consumes the document and hands back a freshly parsed one, so
/// offsets from before a write can never be used against the new bytes.
#[derive(Debug)]
pub struct SaveDocument {
    header: SaveHeader,
    body: Result<SaveBody, BodyError>,
    options: CodecOptions,
}

impl SaveDocument {
    pub fn open(path: &Path) -> Result<Self, HeaderDecodeError> {
        Self::open_with(path, CodecOptions::default())
    }

    pub fn open_with(path: &Path, options: CodecOptions) -> Result<Self, HeaderDecodeError> {
        let header = parse_header(path)?;
        let body = parse_body_with(&header, &options);
        if let Err(e) = &body {
            debug!(path = %path.display(), "body unavailable: {e}");
        }
        Ok(Self {
            header,
            body,
            options,
        })
    }

    pub fn path(&self) -> &Path {
        &self.header.path
    }

    pub fn header(&self) -> &SaveHeader {
        &self.header
    }

    pub fn body(&self) -> Option<&SaveBody> {
        self.body.as_ref().ok()
    }

    pub fn body_error(&self) -> Option<&BodyError> {
        self.body.as_ref().err()
    }

    fn body_mut(&mut self) -> Result<&mut SaveBody, WriteError> {
        self.body
            .as_mut()
            .map_err(|e| WriteError::BodyUnavailable(e.to_string()))
    }

    pub fn set_ironman(&mut self, ironman: bool) -> Result<(), WriteError> {
        self.body_mut()?.ironman = ironman;
        Ok(())
    }

    pub fn set_resource(&mut self, index: usize, value: i32) -> Result<(), WriteError> {
        let body = self.body_mut()?;
        let len = body.resources.len();
        let slot = body
            .resources
            .get_mut(index)
            .ok_or(WriteError::FieldOutOfRange {
                field: "resource",
                index,
                len,
            })?;
        *slot = value;
        Ok(())
    }

    /// Replace every resource value; the array length cannot change.
    pub fn set_resources(&mut self, values: &[i32]) -> Result<(), WriteError> {
        let body = self.body_mut()?;
        if values.len() != body.resources.len() {
            return Err(WriteError::ResourceLengthChanged {
                original: body.resources.len(),
                edited: values.len(),
            });
        }
        body.resources.copy_from_slice(values);
        Ok(())
    }

    pub fn set_planet_control(
        &mut self,
        index: usize,
        control: i32,
        control_change: Option<i32>,
    ) -> Result<(), WriteError> {
        let body = self.body_mut()?;
        let len = body.planets.len();
        let planet = body
            .planets
            .get_mut(index)
            .ok_or(WriteError::FieldOutOfRange {
                field: "planet",
                index,
                len,
            })?;
        planet.control = control;
        if let Some(change) = control_change {
            planet.control_change = change;
        }
        Ok(())
    }

    pub fn set_save_name(&mut self, name: impl Into<String>) {
        self.header.save_name = name.into();
    }

    pub fn set_timestamp(&mut self, ticks: i64) {
        self.header.timestamp_ticks = ticks;
    }

    /// Patch edited body fields in place, then re-open the file.
    pub fn commit_body(self) -> Result<(Self, PatchReport), WriteError> {
        let body = self
            .body
            .as_ref()
            .map_err(|e| WriteError::BodyUnavailable(e.to_string()))?;
        let report = write_body_changes(&self.header, body)?;
        let reopened = Self::reopen(self.header.path, self.options)?;
        Ok((reopened, report))
    }

    /// Rewrite the header, keeping the body bytes, then re-open the file.
    pub fn commit_header(mut self) -> Result<Self, WriteError> {
        let path = self.header.path.clone();
        write_header(&mut self.header, &path)?;
        Self::reopen(path, self.options)
    }

    fn reopen(path: PathBuf, options: CodecOptions) -> Result<Self, WriteError> {
        Self::open_with(&path, options).map_err(WriteError::Reparse)
    }
}
