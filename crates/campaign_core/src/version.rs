//! Version policy for the save body.
//!
//! Every format drift the decoder knows about is listed once in
//! [`FIELD_RULES`]. Decoders never compare raw version numbers; they ask the
//! [`FormatPolicy`] built for the file and use the strategy it selected.

use std::io::{self, Read, Seek};

use serde::Serialize;

use crate::reader::LittleEndianReader;

/// Oldest body layout this decoder understands.
pub const MIN_BODY_VERSION: i32 = 6;
/// Newest body layout this decoder has been validated against.
pub const MAX_BODY_VERSION: i32 = 110;

pub const CORRUPTION_MARKER: i32 = 42;
/// Pre-float saves store attributes as integers scaled by this factor.
pub const ATTRIBUTE_SCALE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VersionedField {
    /// Header carries a strategy-config name; body carries the config flag
    /// and name instead of the global difficulty string.
    StrategyConfig,
    CorruptionMarker,
    FloatAttributes,
    StringActorType,
    /// One marker byte precedes every template reference.
    TemplateMarker,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: VersionedField,
    /// First version using the newer encoding.
    pub since: i32,
}

pub const FIELD_RULES: [FieldRule; 5] = [
    FieldRule {
        field: VersionedField::CorruptionMarker,
        since: 7,
    },
    FieldRule {
        field: VersionedField::FloatAttributes,
        since: 26,
    },
    FieldRule {
        field: VersionedField::StrategyConfig,
        since: 28,
    },
    FieldRule {
        field: VersionedField::StringActorType,
        since: 101,
    },
    FieldRule {
        field: VersionedField::TemplateMarker,
        since: 101,
    },
];

pub fn field_present(field: VersionedField, version: i32) -> bool {
    FIELD_RULES
        .iter()
        .find(|rule| rule.field == field)
        .is_some_and(|rule| version >= rule.since)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BodySupport {
    Supported,
    TooOld,
    TooNew,
}

pub fn body_support(version: i32) -> BodySupport {
    if version < MIN_BODY_VERSION {
        BodySupport::TooOld
    } else if version > MAX_BODY_VERSION {
        BodySupport::TooNew
    } else {
        BodySupport::Supported
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfigLabelEncoding {
    /// bool has-strategy-config + string config name
    StrategyConfig,
    /// string global difficulty
    GlobalDifficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttributeEncoding {
    Float,
    ScaledInt,
}

impl AttributeEncoding {
    pub fn read<R: Read + Seek>(self, r: &mut LittleEndianReader<R>) -> io::Result<f32> {
        match self {
            Self::Float => r.read_f32(),
            Self::ScaledInt => Ok(r.read_i32()? as f32 / ATTRIBUTE_SCALE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActorTypeEncoding {
    Integer,
    Tag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemplateRefEncoding {
    Plain,
    Marked,
}

impl TemplateRefEncoding {
    pub fn read<R: Read + Seek>(self, r: &mut LittleEndianReader<R>) -> io::Result<String> {
        if self == Self::Marked {
            r.read_u8()?;
        }
        r.read_string()
    }

    pub fn skip<R: Read + Seek>(self, r: &mut LittleEndianReader<R>) -> io::Result<()> {
        if self == Self::Marked {
            r.skip(1)?;
        }
        r.skip_string()
    }
}

/// Decode strategies for one file, selected once from [`FIELD_RULES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatPolicy {
    pub version: i32,
    pub config_label: ConfigLabelEncoding,
    pub corruption_marker: bool,
    pub attributes: AttributeEncoding,
    pub actor_type: ActorTypeEncoding,
    pub template_ref: TemplateRefEncoding,
}

impl FormatPolicy {
    pub fn for_version(version: i32) -> Self {
        let has = |field| field_present(field, version);
        Self {
            version,
            config_label: if has(VersionedField::StrategyConfig) {
                ConfigLabelEncoding::StrategyConfig
            } else {
                ConfigLabelEncoding::GlobalDifficulty
            },
            corruption_marker: has(VersionedField::CorruptionMarker),
            attributes: if has(VersionedField::FloatAttributes) {
                AttributeEncoding::Float
            } else {
                AttributeEncoding::ScaledInt
            },
            actor_type: if has(VersionedField::StringActorType) {
                ActorTypeEncoding::Tag
            } else {
                ActorTypeEncoding::Integer
            },
            template_ref: if has(VersionedField::TemplateMarker) {
                TemplateRefEncoding::Marked
            } else {
                TemplateRefEncoding::Plain
            },
        }
    }

    pub fn header_has_strategy_config(&self) -> bool {
        self.config_label == ConfigLabelEncoding::StrategyConfig
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_config_starts_after_27() {
        assert!(!FormatPolicy::for_version(27).header_has_strategy_config());
        assert!(FormatPolicy::for_version(28).header_has_strategy_config());
    }

    #[test]
    fn attribute_encoding_switches_at_26() {
        assert_eq!(
            FormatPolicy::for_version(25).attributes,
            AttributeEncoding::ScaledInt
        );
        assert_eq!(
            FormatPolicy::for_version(26).attributes,
            AttributeEncoding::Float
        );
    }

    #[test]
    fn tag_actor_type_and_marker_arrive_together() {
        let old = FormatPolicy::for_version(100);
        let new = FormatPolicy::for_version(101);
        assert_eq!(old.actor_type, ActorTypeEncoding::Integer);
        assert_eq!(old.template_ref, TemplateRefEncoding::Plain);
        assert_eq!(new.actor_type, ActorTypeEncoding::Tag);
        assert_eq!(new.template_ref, TemplateRefEncoding::Marked);
    }

    #[test]
    fn corruption_marker_from_version_7() {
        assert!(!FormatPolicy::for_version(6).corruption_marker);
        assert!(FormatPolicy::for_version(7).corruption_marker);
    }

    #[test]
    fn support_window_bounds_are_inclusive() {
        assert_eq!(body_support(MIN_BODY_VERSION - 1), BodySupport::TooOld);
        assert_eq!(body_support(MIN_BODY_VERSION), BodySupport::Supported);
        assert_eq!(body_support(MAX_BODY_VERSION), BodySupport::Supported);
        assert_eq!(body_support(MAX_BODY_VERSION + 1), BodySupport::TooNew);
    }
}
