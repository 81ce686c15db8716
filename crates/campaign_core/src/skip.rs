//! Structural skips over sub-records the editor never materializes.
//!
//! Each function consumes exactly the bytes its record occupies for the
//! policy it is given and leaves the cursor on the first byte after it.

use std::io::{Read, Seek};

use crate::config::CodecOptions;
use crate::error::ExtendedFailureReason;
use crate::reader::LittleEndianReader;
use crate::version::FormatPolicy;

pub type SkipResult<T = ()> = Result<T, ExtendedFailureReason>;

/// Everything a decoder needs to know about the file it is walking.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext {
    pub policy: FormatPolicy,
    pub options: CodecOptions,
}

impl DecodeContext {
    pub fn new(policy: FormatPolicy, options: CodecOptions) -> Self {
        Self { policy, options }
    }
}

/// Read an i32 list count, rejecting negative or implausibly large values.
pub fn read_count<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult<usize> {
    let count = r.read_i32()?;
    check_count(count, ctx)
}

pub fn check_count(count: i32, ctx: &DecodeContext) -> SkipResult<usize> {
    let limit = ctx.options.max_plausible_count;
    if !(0..=limit).contains(&count) {
        return Err(ExtendedFailureReason::ImplausibleCount { count, limit });
    }
    Ok(count as usize)
}

pub fn skip_template_ref<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    ctx.policy.template_ref.skip(r)?;
    Ok(())
}

pub fn skip_template_ref_list<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    let count = read_count(r, ctx)?;
    for _ in 0..count {
        skip_template_ref(r, ctx)?;
    }
    Ok(())
}

pub fn skip_ship_upgrades<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    let slots = read_count(r, ctx)?;
    for _ in 0..slots {
        r.skip_string()?;
        if r.read_bool()? {
            skip_template_ref(r, ctx)?;
        }
    }
    Ok(())
}

pub fn skip_item_container<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    let items = read_count(r, ctx)?;
    for _ in 0..items {
        skip_template_ref(r, ctx)?;
        r.skip(4)?; // stack size
        skip_template_ref_list(r, ctx)?;
    }
    Ok(())
}

pub fn skip_black_market<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    r.skip(4)?; // refresh countdown
    let stacks = read_count(r, ctx)?;
    for _ in 0..stacks {
        skip_template_ref(r, ctx)?;
        r.skip(8)?; // quantity, price
    }
    Ok(())
}

pub fn skip_story_factions<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    let factions = read_count(r, ctx)?;
    for _ in 0..factions {
        skip_template_ref(r, ctx)?;
        r.skip(5)?; // standing, revealed
    }
    Ok(())
}

pub fn skip_unit_statistics<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    let stats = read_count(r, ctx)?;
    for _ in 0..stats {
        r.skip_string()?;
        r.skip(4)?;
    }
    Ok(())
}

pub fn skip_emotional_states<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    let states = read_count(r, ctx)?;
    for _ in 0..states {
        skip_template_ref(r, ctx)?;
        r.skip(4)?; // remaining turns
    }
    Ok(())
}

pub fn skip_strategic_duration<R: Read + Seek>(r: &mut LittleEndianReader<R>) -> SkipResult {
    r.skip(8)?;
    Ok(())
}

pub fn skip_conversation_ref<R: Read + Seek>(r: &mut LittleEndianReader<R>) -> SkipResult {
    if r.read_bool()? {
        r.skip_string()?;
    }
    Ok(())
}

pub fn skip_health_status<R: Read + Seek>(r: &mut LittleEndianReader<R>) -> SkipResult {
    r.skip(8)?;
    Ok(())
}

pub fn skip_skill_indices<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    let count = read_count(r, ctx)?;
    r.skip(count as u64 * 4)?;
    Ok(())
}

pub fn skip_battle_plan<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    let slots = read_count(r, ctx)?;
    r.skip(slots as u64 * 4)?;
    r.skip(1)?; // locked
    Ok(())
}

pub fn skip_operation_result<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    let missions = read_count(r, ctx)?;
    for _ in 0..missions {
        skip_template_ref(r, ctx)?;
        r.skip(1)?; // success
    }
    Ok(())
}

pub fn skip_duration_template<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    ctx: &DecodeContext,
) -> SkipResult {
    skip_template_ref(r, ctx)?;
    r.skip(4)?; // elapsed
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::writer::LittleEndianWriter;

    fn ctx(version: i32) -> DecodeContext {
        DecodeContext::new(FormatPolicy::for_version(version), CodecOptions::default())
    }

    fn build(f: impl FnOnce(&mut LittleEndianWriter<Cursor<Vec<u8>>>)) -> Vec<u8> {
        let mut w = LittleEndianWriter::new(Cursor::new(Vec::new()));
        f(&mut w);
        w.into_inner().into_inner()
    }

    #[test]
    fn template_list_marker_only_in_new_formats() {
        let old = build(|w| {
            w.write_i32(2).unwrap();
            w.write_string("PerkA").unwrap();
            w.write_string("PerkB").unwrap();
        });
        let new = build(|w| {
            w.write_i32(2).unwrap();
            w.write_u8(1).unwrap();
            w.write_string("PerkA").unwrap();
            w.write_u8(1).unwrap();
            w.write_string("PerkB").unwrap();
        });

        let mut r = LittleEndianReader::new(Cursor::new(old.clone()));
        skip_template_ref_list(&mut r, &ctx(100)).unwrap();
        assert_eq!(r.position().unwrap(), old.len() as u64);

        let mut r = LittleEndianReader::new(Cursor::new(new.clone()));
        skip_template_ref_list(&mut r, &ctx(101)).unwrap();
        assert_eq!(r.position().unwrap(), new.len() as u64);
    }

    #[test]
    fn item_container_consumes_nested_upgrades() {
        let bytes = build(|w| {
            w.write_i32(1).unwrap();
            w.write_string("Rifle").unwrap();
            w.write_i32(3).unwrap();
            w.write_i32(1).unwrap();
            w.write_string("Scope").unwrap();
            w.write_u8(0xEE).unwrap(); // trailing sentinel
        });
        let mut r = LittleEndianReader::new(Cursor::new(bytes));
        skip_item_container(&mut r, &ctx(50)).unwrap();
        assert_eq!(r.read_u8().unwrap(), 0xEE);
    }

    #[test]
    fn ship_upgrades_skip_empty_slots() {
        let bytes = build(|w| {
            w.write_i32(2).unwrap();
            w.write_string("Bow").unwrap();
            w.write_bool(false).unwrap();
            w.write_string("Stern").unwrap();
            w.write_bool(true).unwrap();
            w.write_string("Lance").unwrap();
            w.write_u8(0xEE).unwrap();
        });
        let mut r = LittleEndianReader::new(Cursor::new(bytes));
        skip_ship_upgrades(&mut r, &ctx(50)).unwrap();
        assert_eq!(r.read_u8().unwrap(), 0xEE);
    }

    #[test]
    fn implausible_count_is_reported_not_trusted() {
        let bytes = build(|w| w.write_i32(5000).unwrap());
        let mut r = LittleEndianReader::new(Cursor::new(bytes));
        let err = skip_story_factions(&mut r, &ctx(50)).unwrap_err();
        assert!(matches!(
            err,
            ExtendedFailureReason::ImplausibleCount {
                count: 5000,
                limit: 1000
            }
        ));
    }

    #[test]
    fn negative_count_is_implausible() {
        let bytes = build(|w| w.write_i32(-1).unwrap());
        let mut r = LittleEndianReader::new(Cursor::new(bytes));
        assert!(skip_battle_plan(&mut r, &ctx(50)).is_err());
    }

    #[test]
    fn truncated_record_is_io_error() {
        let bytes = build(|w| {
            w.write_i32(4).unwrap();
            w.write_i32(1).unwrap();
        });
        let mut r = LittleEndianReader::new(Cursor::new(bytes));
        let err = skip_skill_indices(&mut r, &ctx(50)).unwrap_err();
        assert!(matches!(err, ExtendedFailureReason::Io(_)));
    }
}
