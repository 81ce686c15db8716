//! Body codec with two validity tiers.
//!
//! The essential fields (flags, labels, resources) either decode or the
//! whole body is rejected. Everything after them is decoded best effort: a
//! failure there is recorded on the body and the entities read up to that
//! point are kept.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek};

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::config::CodecOptions;
use crate::entities::{
    self, LeaderData, LeaderListKind, OperationData, PLANET_RNG_WORDS, PlanetData, SquaddieData,
};
use crate::error::{
    BodyError, EssentialBodyDecodeError, ExtendedBodyFailure, ExtendedFailureReason,
    UnsupportedVersion,
};
use crate::header::SaveHeader;
use crate::offsets::{BodyOffsets, IronmanOffset, PlanetSectionOffset, ResourcesOffset};
use crate::reader::LittleEndianReader;
use crate::resync::{self, Anchor};
use crate::skip::{self, DecodeContext};
use crate::version::{
    BodySupport, CORRUPTION_MARKER, ConfigLabelEncoding, FormatPolicy, MAX_BODY_VERSION,
    MIN_BODY_VERSION, body_support,
};

/// Extended sections in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BodySection {
    ShipUpgrades,
    OwnedItems,
    BlackMarket,
    StoryFactions,
    Squaddies,
    Roster,
    BattlePlan,
    Planets,
    Operations,
}

impl fmt::Display for BodySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ShipUpgrades => "ship upgrades",
            Self::OwnedItems => "owned items",
            Self::BlackMarket => "black market",
            Self::StoryFactions => "story factions",
            Self::Squaddies => "squaddies",
            Self::Roster => "roster",
            Self::BattlePlan => "battle plan",
            Self::Planets => "planets",
            Self::Operations => "operations",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConfigLabel {
    StrategyConfig { present: bool, name: String },
    GlobalDifficulty(String),
}

impl ConfigLabel {
    pub fn display_name(&self) -> &str {
        match self {
            Self::StrategyConfig { name, .. } => name,
            Self::GlobalDifficulty(name) => name,
        }
    }
}

fn serialize_failure<S: Serializer>(
    failure: &Option<ExtendedBodyFailure>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match failure {
        Some(f) => s.serialize_some(&f.to_string()),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Serialize)]
pub struct SaveBody {
    pub version: i32,
    pub total_play_time: f64,
    pub ironman: bool,
    pub ironman_name: String,
    pub seed: i32,
    pub picked_item_pack: bool,
    pub picked_leaders: bool,
    pub config_label: ConfigLabel,
    pub resources: Vec<i32>,
    /// `None` for formats without the marker.
    pub corruption_marker_ok: Option<bool>,

    pub squaddie_next_id: Option<i32>,
    pub squaddies: Vec<SquaddieData>,
    pub hired: Vec<LeaderData>,
    pub dismissed: Vec<LeaderData>,
    /// Unburied first, then buried; see [`LeaderData::list`].
    pub dead: Vec<LeaderData>,
    pub planet_rng: Option<[u32; PLANET_RNG_WORDS]>,
    pub planets: Vec<PlanetData>,
    pub current_operation: Option<OperationData>,

    /// Where decoding stopped, successful or not.
    pub body_end_offset: u64,
    #[serde(skip)]
    pub offsets: BodyOffsets,
    #[serde(serialize_with = "serialize_failure")]
    pub extended_failure: Option<ExtendedBodyFailure>,
}

impl SaveBody {
    pub fn is_fully_valid(&self) -> bool {
        self.extended_failure.is_none()
    }

    pub fn leaders(&self) -> impl Iterator<Item = &LeaderData> {
        self.hired
            .iter()
            .chain(self.dismissed.iter())
            .chain(self.dead.iter())
    }
}

pub fn parse_body(header: &SaveHeader) -> Result<SaveBody, BodyError> {
    parse_body_with(header, &CodecOptions::default())
}

pub fn parse_body_with(header: &SaveHeader, options: &CodecOptions) -> Result<SaveBody, BodyError> {
    match body_support(header.version) {
        BodySupport::TooOld => {
            return Err(UnsupportedVersion::TooOld {
                version: header.version,
                minimum: MIN_BODY_VERSION,
            }
            .into());
        }
        BodySupport::TooNew => {
            return Err(UnsupportedVersion::TooNew {
                version: header.version,
                maximum: MAX_BODY_VERSION,
            }
            .into());
        }
        BodySupport::Supported => {}
    }

    let open_err = |source| BodyError::Open {
        path: header.path.clone(),
        source,
    };
    let file = File::open(&header.path).map_err(open_err)?;
    let file_len = file.metadata().map_err(open_err)?.len();
    let mut r = LittleEndianReader::new(BufReader::new(file));
    r.seek_to(header.body_offset).map_err(open_err)?;

    let ctx = DecodeContext::new(header.policy(), *options);
    let mut body = read_essential(&mut r, &ctx, header, file_len)?;

    if let Err(failure) = read_extended(&mut r, &ctx, &mut body) {
        warn!(
            path = %header.path.display(),
            section = %failure.section,
            offset = failure.offset,
            "extended body decode failed: {}",
            failure.reason
        );
        body.body_end_offset = failure.offset;
        body.extended_failure = Some(failure);
    }

    debug!(
        path = %header.path.display(),
        squaddies = body.squaddies.len(),
        leaders = body.leaders().count(),
        planets = body.planets.len(),
        end = body.body_end_offset,
        "parsed save body"
    );
    Ok(body)
}

fn essential<R: Read + Seek, T>(
    r: &mut LittleEndianReader<R>,
    field: &'static str,
    read: impl FnOnce(&mut LittleEndianReader<R>) -> io::Result<T>,
) -> Result<T, EssentialBodyDecodeError> {
    let offset = r.position().unwrap_or_default();
    read(r).map_err(|source| EssentialBodyDecodeError {
        field,
        offset,
        source,
    })
}

fn read_essential<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
    header: &SaveHeader,
    file_len: u64,
) -> Result<SaveBody, EssentialBodyDecodeError> {
    let policy: FormatPolicy = ctx.policy;

    let total_play_time = essential(r, "total_play_time", |r| r.read_f64())?;
    let ironman_at = essential(r, "ironman", |r| r.position())?;
    let ironman = essential(r, "ironman", |r| r.read_bool())?;
    let ironman_name = essential(r, "ironman_name", |r| r.read_string())?;
    let seed = essential(r, "seed", |r| r.read_i32())?;
    let picked_item_pack = essential(r, "picked_item_pack", |r| r.read_bool())?;
    let picked_leaders = essential(r, "picked_leaders", |r| r.read_bool())?;

    let config_label = match policy.config_label {
        ConfigLabelEncoding::StrategyConfig => {
            let present = essential(r, "has_strategy_config", |r| r.read_bool())?;
            let name = essential(r, "strategy_config_name", |r| r.read_string())?;
            ConfigLabel::StrategyConfig { present, name }
        }
        ConfigLabelEncoding::GlobalDifficulty => {
            ConfigLabel::GlobalDifficulty(essential(r, "global_difficulty", |r| r.read_string())?)
        }
    };

    let resources_at = essential(r, "resources", |r| r.position())?;
    let resource_count = essential(r, "resources", |r| {
        let count = r.read_i32()?;
        if !(0..=ctx.options.max_plausible_count).contains(&count) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("implausible resource count {count}"),
            ));
        }
        Ok(count)
    })?;
    let resources = essential(r, "resources", |r| r.read_i32_vec(resource_count as usize))?;

    let corruption_marker_ok = if policy.corruption_marker {
        let marker = essential(r, "corruption_marker", |r| r.read_i32())?;
        if marker != CORRUPTION_MARKER {
            warn!(
                path = %header.path.display(),
                found = marker,
                expected = CORRUPTION_MARKER,
                "corruption marker mismatch"
            );
        }
        Some(marker == CORRUPTION_MARKER)
    } else {
        None
    };

    let body_end_offset = essential(r, "essential_end", |r| r.position())?;

    Ok(SaveBody {
        version: header.version,
        total_play_time,
        ironman,
        ironman_name,
        seed,
        picked_item_pack,
        picked_leaders,
        config_label,
        resources,
        corruption_marker_ok,
        squaddie_next_id: None,
        squaddies: Vec::new(),
        hired: Vec::new(),
        dismissed: Vec::new(),
        dead: Vec::new(),
        planet_rng: None,
        planets: Vec::new(),
        current_operation: None,
        body_end_offset,
        offsets: BodyOffsets {
            path: header.path.clone(),
            file_len,
            ironman: IronmanOffset(ironman_at),
            resources: ResourcesOffset {
                position: resources_at,
                count: resource_count,
            },
            planets: None,
        },
        extended_failure: None,
    })
}

/// Run one section decoder, tagging any failure with the section and offset.
fn in_section<R: Read + Seek, T>(
    r: &mut LittleEndianReader<R>,
    section: BodySection,
    decode: impl FnOnce(&mut LittleEndianReader<R>) -> Result<T, ExtendedFailureReason>,
) -> Result<T, ExtendedBodyFailure> {
    let start = r.position().unwrap_or_default();
    decode(r).map_err(|reason| ExtendedBodyFailure {
        section,
        offset: r.position().unwrap_or(start),
        reason,
    })
}

fn read_extended<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
    body: &mut SaveBody,
) -> Result<(), ExtendedBodyFailure> {
    in_section(r, BodySection::ShipUpgrades, |r| skip::skip_ship_upgrades(r, ctx))?;
    in_section(r, BodySection::OwnedItems, |r| skip::skip_item_container(r, ctx))?;
    in_section(r, BodySection::BlackMarket, |r| skip::skip_black_market(r, ctx))?;
    in_section(r, BodySection::StoryFactions, |r| skip::skip_story_factions(r, ctx))?;

    let outcome = in_section(r, BodySection::Squaddies, |r| {
        entities::decode_squaddies(r, ctx, &mut body.squaddies)
    })?;
    body.squaddie_next_id = Some(outcome.next_id);
    if let Some(trigger) = outcome.resync {
        debug!(?trigger, "squaddie list needs resync");
        in_section(r, BodySection::Squaddies, |r| {
            resync::resync_to(r, Anchor::Roster, ctx.policy.version, &ctx.options)
                .map_err(ExtendedFailureReason::from)
        })?;
    }

    in_section(r, BodySection::Roster, |r| {
        for kind in LeaderListKind::ALL {
            let out = match kind {
                LeaderListKind::Hired => &mut body.hired,
                LeaderListKind::Dismissed => &mut body.dismissed,
                LeaderListKind::DeadUnburied | LeaderListKind::DeadBuried => &mut body.dead,
            };
            entities::decode_leader_list(r, ctx, kind, out)?;
        }
        Ok(())
    })?;

    in_section(r, BodySection::BattlePlan, |r| skip::skip_battle_plan(r, ctx))?;

    // Recorded before decoding so planets read before a failure stay patchable.
    if let Ok(planets_at) = r.position() {
        body.offsets.planets = Some(PlanetSectionOffset(planets_at));
    }
    let rng = in_section(r, BodySection::Planets, |r| {
        entities::decode_planets(r, ctx, &mut body.planets)
    })?;
    body.planet_rng = Some(rng);

    body.current_operation = in_section(r, BodySection::Operations, |r| {
        entities::decode_operations(r, ctx)
    })?;

    body.body_end_offset = r.position().unwrap_or(body.body_end_offset);
    Ok(())
}
