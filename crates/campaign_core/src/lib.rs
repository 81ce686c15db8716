//! Codec for campaign save files.
//!
//! [`parse_header`] reads the fixed header, [`parse_body`] the body in two
//! tiers, and [`write_body_changes`] / [`write_header`] put edits back
//! without disturbing bytes nobody asked to change. [`SaveDocument`] wraps
//! the three into one edit session.

pub mod backup;
pub mod body;
pub mod config;
pub mod document;
pub mod entities;
pub mod error;
pub mod header;
pub mod lifecycle;
pub mod modmeta;
pub mod offsets;
pub mod patch;
pub mod reader;
pub mod resources;
pub mod resync;
pub mod skip;
pub mod timestamp;
pub mod version;
pub mod writer;

pub use body::{BodySection, ConfigLabel, SaveBody, parse_body, parse_body_with};
pub use config::CodecOptions;
pub use document::SaveDocument;
pub use entities::{
    ActorType, LeaderAttribute, LeaderData, LeaderListKind, OperationData, PlanetData,
    SquaddieData,
};
pub use error::{
    BodyError, EssentialBodyDecodeError, ExtendedBodyFailure, ExtendedFailureReason,
    HeaderDecodeError, ResyncFailure, UnsupportedVersion, WriteError,
};
pub use header::{SaveHeader, SaveStateKind, parse_header, write_header};
pub use lifecycle::{LifecycleError, SaveUnit, delete_save, duplicate_save, list_saves};
pub use modmeta::{ModEntry, ModMetaError, ModMetadata, read_mod_metadata};
pub use patch::{PatchReport, PatchedField, PatchedRange, PlanetCountMismatch, write_body_changes};
pub use version::{FormatPolicy, MAX_BODY_VERSION, MIN_BODY_VERSION};
