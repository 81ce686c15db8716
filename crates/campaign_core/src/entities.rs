use std::fmt;
use std::io::{Read, Seek};

use serde::Serialize;
use tracing::debug;

use crate::reader::LittleEndianReader;
use crate::skip::{self, DecodeContext, SkipResult};
use crate::version::ActorTypeEncoding;

/// Template name marking a squaddie slot that is not a squaddie.
pub const PLACEHOLDER_TEMPLATE: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActorType {
    Infantry,
    Vehicle,
    Unknown(i32),
    /// String tag with no integer equivalent.
    Unrecognized(String),
}

impl ActorType {
    pub const INFANTRY_RAW: i32 = 0;
    pub const VEHICLE_RAW: i32 = 1;

    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::INFANTRY_RAW => Self::Infantry,
            Self::VEHICLE_RAW => Self::Vehicle,
            other => Self::Unknown(other),
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Infantry" => Self::Infantry,
            "Vehicle" => Self::Vehicle,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn raw(&self) -> Option<i32> {
        match self {
            Self::Infantry => Some(Self::INFANTRY_RAW),
            Self::Vehicle => Some(Self::VEHICLE_RAW),
            Self::Unknown(v) => Some(*v),
            Self::Unrecognized(_) => None,
        }
    }

    fn read<R: Read + Seek>(
        encoding: ActorTypeEncoding,
        r: &mut LittleEndianReader<R>,
    ) -> SkipResult<Self> {
        Ok(match encoding {
            ActorTypeEncoding::Integer => Self::from_raw(r.read_i32()?),
            ActorTypeEncoding::Tag => Self::from_tag(&r.read_string()?),
        })
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infantry => f.write_str("Infantry"),
            Self::Vehicle => f.write_str("Vehicle"),
            Self::Unknown(v) => write!(f, "Unknown ({v})"),
            Self::Unrecognized(tag) => write!(f, "{tag}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquaddieData {
    pub id: i32,
    pub gender: u8,
    pub skin: u8,
    pub home_planet_type: i32,
    pub portrait_index: i32,
    pub first_name: String,
    pub last_name: String,
    pub template: String,
}

impl SquaddieData {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Why the squaddie list could not be walked to its declared end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncTrigger {
    /// A placeholder entry ended at this offset.
    Placeholder { offset: u64 },
    ImplausibleCount { count: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquaddieOutcome {
    pub next_id: i32,
    pub resync: Option<ResyncTrigger>,
}

/// Decode the squaddie section into `out`.
///
/// Entries are pushed as they are read so a later failure keeps them.
/// Decoding stops at the first placeholder entry; the declared count is not
/// trusted past it.
pub fn decode_squaddies<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
    out: &mut Vec<SquaddieData>,
) -> SkipResult<SquaddieOutcome> {
    let next_id = r.read_i32()?;
    let raw_count = r.read_i32()?;
    let count = match skip::check_count(raw_count, ctx) {
        Ok(n) => n,
        Err(_) => {
            return Ok(SquaddieOutcome {
                next_id,
                resync: Some(ResyncTrigger::ImplausibleCount { count: raw_count }),
            });
        }
    };

    for _ in 0..count {
        let id = r.read_i32()?;
        let gender = r.read_u8()?;
        let skin = r.read_u8()?;
        let home_planet_type = r.read_i32()?;
        let portrait_index = r.read_i32()?;
        let first_name = r.read_string()?;
        let last_name = r.read_string()?;
        let template = ctx.policy.template_ref.read(r)?;

        if template == PLACEHOLDER_TEMPLATE {
            let offset = r.position()?;
            debug!(id, offset, "placeholder squaddie entry");
            return Ok(SquaddieOutcome {
                next_id,
                resync: Some(ResyncTrigger::Placeholder { offset }),
            });
        }

        out.push(SquaddieData {
            id,
            gender,
            skin,
            home_planet_type,
            portrait_index,
            first_name,
            last_name,
            template,
        });
    }

    Ok(SquaddieOutcome {
        next_id,
        resync: None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LeaderListKind {
    Hired,
    Dismissed,
    DeadUnburied,
    DeadBuried,
}

impl LeaderListKind {
    /// On-disk order of the four lists.
    pub const ALL: [Self; 4] = [
        Self::Hired,
        Self::Dismissed,
        Self::DeadUnburied,
        Self::DeadBuried,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderAttribute {
    pub name: String,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderData {
    pub list: LeaderListKind,
    pub actor_type: ActorType,
    pub template: String,
    pub id: i32,
    pub custom_name: String,
    pub attributes: Vec<LeaderAttribute>,
}

fn read_attributes<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult<Vec<LeaderAttribute>> {
    let count = skip::read_count(r, ctx)?;
    let mut attributes = Vec::with_capacity(count);
    for _ in 0..count {
        let name = r.read_string()?;
        let value = ctx.policy.attributes.read(r)?;
        attributes.push(LeaderAttribute { name, value });
    }
    Ok(attributes)
}

/// Skip everything in a leader record after the attribute list.
fn skip_leader_tail<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    skip::skip_template_ref_list(r, ctx)?; // perks
    skip::skip_item_container(r, ctx)?;
    skip::skip_unit_statistics(r, ctx)?;
    skip::skip_emotional_states(r, ctx)?;
    skip::skip_strategic_duration(r)?;
    skip::skip_conversation_ref(r)?;
    skip::skip_health_status(r)?;
    skip::skip_skill_indices(r, ctx)
}

pub fn decode_leader<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
    list: LeaderListKind,
) -> SkipResult<LeaderData> {
    let actor_type = ActorType::read(ctx.policy.actor_type, r)?;
    let template = ctx.policy.template_ref.read(r)?;
    let id = r.read_i32()?;
    let custom_name = r.read_string()?;
    let attributes = read_attributes(r, ctx)?;
    skip_leader_tail(r, ctx)?;

    Ok(LeaderData {
        list,
        actor_type,
        template,
        id,
        custom_name,
        attributes,
    })
}

pub fn decode_leader_list<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
    list: LeaderListKind,
    out: &mut Vec<LeaderData>,
) -> SkipResult {
    let count = skip::read_count(r, ctx)?;
    for _ in 0..count {
        out.push(decode_leader(r, ctx, list)?);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanetData {
    pub template: String,
    pub control: i32,
    pub control_change: i32,
}

pub const PLANET_RNG_WORDS: usize = 4;

/// Decode the planet section: RNG state, then the planet list into `out`.
pub fn decode_planets<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
    out: &mut Vec<PlanetData>,
) -> SkipResult<[u32; PLANET_RNG_WORDS]> {
    let rng = r.read_u32_array::<PLANET_RNG_WORDS>()?;
    let count = skip::read_count(r, ctx)?;
    for _ in 0..count {
        let template = ctx.policy.template_ref.read(r)?;
        let control = r.read_i32()?;
        let control_change = r.read_i32()?;
        out.push(PlanetData {
            template,
            control,
            control_change,
        });
    }
    Ok(rng)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationData {
    pub template: String,
    pub story_faction: String,
    pub faction: String,
    pub planet: String,
    pub current_mission_index: i32,
}

/// Decode the operations section; `None` when no operation is running.
pub fn decode_operations<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult<Option<OperationData>> {
    skip::skip_template_ref_list(r, ctx)?; // not-available operations
    r.skip(4)?; // seed
    if !r.read_bool()? {
        return Ok(None);
    }

    let template = ctx.policy.template_ref.read(r)?;
    let story_faction = ctx.policy.template_ref.read(r)?;
    let faction = ctx.policy.template_ref.read(r)?;
    skip::skip_operation_result(r, ctx)?;
    let planet = ctx.policy.template_ref.read(r)?;
    skip::skip_duration_template(r, ctx)?;
    let current_mission_index = r.read_i32()?;

    Ok(Some(OperationData {
        template,
        story_faction,
        faction,
        planet,
        current_mission_index,
    }))
}
