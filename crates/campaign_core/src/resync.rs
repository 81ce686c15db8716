//! Heuristic recovery of the stream position.
//!
//! When a count or a placeholder entry shows that the decoder has lost track
//! of record boundaries, the scanner walks forward byte by byte looking for a
//! known section signature: a small i32 count followed by a short string
//! that matches one of the section's structural tags.
//!
//! Every known signature lives in [`SIGNATURES`]. The table is best effort;
//! a save variant with no matching signature makes the scan fail.

use std::fmt;
use std::io::{Read, Seek};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CodecOptions;
use crate::error::ResyncFailure;
use crate::reader::LittleEndianReader;

/// Section starts the scanner knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Anchor {
    /// First leader list (hired): count, then the first leader's actor tag.
    Roster,
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Roster => f.write_str("roster"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub anchor: Anchor,
    /// Tag strings accepted right after the count.
    pub tags: &'static [&'static str],
    /// First format version whose layout puts a tag string there.
    pub since: i32,
}

pub const SIGNATURES: &[Signature] = &[Signature {
    anchor: Anchor::Roster,
    tags: &["Infantry", "Vehicle"],
    since: 101,
}];

fn signatures_for(anchor: Anchor, version: i32) -> impl Iterator<Item = &'static Signature> {
    SIGNATURES
        .iter()
        .filter(move |s| s.anchor == anchor && version >= s.since)
}

/// Decode a 7-bit length prefix from `bytes`, returning (value, width).
fn varint_at(bytes: &[u8]) -> Option<(u32, usize)> {
    let mut value = 0u32;
    for (i, &b) in bytes.iter().take(5).enumerate() {
        value |= u32::from(b & 0x7F) << (7 * i);
        if b & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

fn matches_at(window: &[u8], at: usize, sig: &Signature, options: &CodecOptions) -> bool {
    let Some(count_bytes) = window
        .get(at..at + 4)
        .and_then(|b| <[u8; 4]>::try_from(b).ok())
    else {
        return false;
    };
    let count = i32::from_le_bytes(count_bytes);
    if !(1..=options.resync_max_count).contains(&count) {
        return false;
    }

    let rest = &window[at + 4..];
    let Some((len, width)) = varint_at(rest) else {
        return false;
    };
    if len == 0 || len > options.resync_max_tag_len {
        return false;
    }
    let Some(tag) = rest.get(width..width + len as usize) else {
        return false;
    };
    sig.tags.iter().any(|t| t.as_bytes() == tag)
}

/// Index of the first signature hit in `window`, if any.
pub fn find_signature(
    window: &[u8],
    anchor: Anchor,
    version: i32,
    options: &CodecOptions,
) -> Option<usize> {
    let sigs: Vec<&Signature> = signatures_for(anchor, version).collect();
    if sigs.is_empty() {
        return None;
    }
    (0..window.len()).find(|&at| sigs.iter().any(|sig| matches_at(window, at, sig, options)))
}

/// Scan forward from the reader's position and leave it on the anchor.
pub fn resync_to<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    anchor: Anchor,
    version: i32,
    options: &CodecOptions,
) -> Result<u64, ResyncFailure> {
    let fail = |start: u64, scanned: u64| ResyncFailure {
        anchor,
        start,
        scanned,
    };

    let start = r.position().map_err(|_| fail(0, 0))?;
    let available = r.remaining().map_err(|_| fail(start, 0))?;
    // Room for a full candidate at the last scanned position.
    let tail = 4 + 5 + u64::from(options.resync_max_tag_len);
    let take = available.min(options.resync_window + tail);
    let window = r.read_bytes(take as usize).map_err(|_| fail(start, 0))?;

    debug!(%anchor, start, bytes = take, "scanning for resync anchor");
    let scanned = take.min(options.resync_window);
    match find_signature(&window, anchor, version, options) {
        Some(at) if (at as u64) < options.resync_window => {
            let found = start + at as u64;
            r.seek_to(found).map_err(|_| fail(start, at as u64))?;
            info!(%anchor, start, found, skipped = at, "resynchronized");
            Ok(found)
        }
        _ => {
            let _ = r.seek_to(start);
            warn!(%anchor, start, scanned, version, "resync found no signature");
            Err(fail(start, scanned))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn opts() -> CodecOptions {
        CodecOptions::default()
    }

    // count=2, "Infantry"
    const INFANTRY_ROSTER: [u8; 13] = [
        0x02, 0x00, 0x00, 0x00, 0x08, b'I', b'n', b'f', b'a', b'n', b't', b'r', b'y',
    ];

    #[test]
    fn finds_anchor_after_noise() {
        let mut bytes = vec![0xFF, 0x00, 0x13, 0x37, 0x00];
        bytes.extend_from_slice(&INFANTRY_ROSTER);
        assert_eq!(find_signature(&bytes, Anchor::Roster, 101, &opts()), Some(5));
    }

    #[test]
    fn vehicle_tag_is_a_signature() {
        let bytes = [
            0x01, 0x00, 0x00, 0x00, 0x07, b'V', b'e', b'h', b'i', b'c', b'l', b'e',
        ];
        assert_eq!(find_signature(&bytes, Anchor::Roster, 110, &opts()), Some(0));
    }

    #[test]
    fn zero_count_is_not_an_anchor() {
        let bytes = [
            0x00, 0x00, 0x00, 0x00, 0x08, b'I', b'n', b'f', b'a', b'n', b't', b'r', b'y',
        ];
        assert_eq!(find_signature(&bytes, Anchor::Roster, 101, &opts()), None);
    }

    #[test]
    fn count_above_limit_is_not_an_anchor() {
        let bytes = [
            0x10, 0x00, 0x00, 0x00, 0x07, b'V', b'e', b'h', b'i', b'c', b'l', b'e',
        ];
        assert_eq!(find_signature(&bytes, Anchor::Roster, 101, &opts()), None);
    }

    #[test]
    fn unknown_tag_is_ignored() {
        let bytes = [0x01, 0x00, 0x00, 0x00, 0x04, b'M', b'e', b'c', b'h'];
        assert_eq!(find_signature(&bytes, Anchor::Roster, 101, &opts()), None);
    }

    #[test]
    fn integer_actor_formats_have_no_signature() {
        assert_eq!(
            find_signature(&INFANTRY_ROSTER, Anchor::Roster, 100, &opts()),
            None
        );
    }

    #[test]
    fn truncated_tag_does_not_match() {
        assert_eq!(
            find_signature(&INFANTRY_ROSTER[..10], Anchor::Roster, 101, &opts()),
            None
        );
    }

    #[test]
    fn reader_is_left_on_the_anchor() {
        let mut bytes = vec![0xAA; 7];
        bytes.extend_from_slice(&INFANTRY_ROSTER);
        let mut r = LittleEndianReader::new(Cursor::new(bytes));
        r.seek_to(2).unwrap();

        let found = resync_to(&mut r, Anchor::Roster, 101, &opts()).unwrap();
        assert_eq!(found, 7);
        assert_eq!(r.position().unwrap(), 7);
        assert_eq!(r.read_i32().unwrap(), 2);
    }

    #[test]
    fn miss_restores_position_and_reports_window() {
        let mut r = LittleEndianReader::new(Cursor::new(vec![0u8; 64]));
        r.seek_to(8).unwrap();

        let err = resync_to(&mut r, Anchor::Roster, 101, &opts()).unwrap_err();
        assert_eq!(err.start, 8);
        assert_eq!(err.scanned, 56);
        assert_eq!(r.position().unwrap(), 8);
    }

    #[test]
    fn anchor_beyond_window_is_a_miss() {
        let mut bytes = vec![0u8; 32];
        bytes.extend_from_slice(&INFANTRY_ROSTER);
        let options = CodecOptions {
            resync_window: 16,
            ..CodecOptions::default()
        };
        let mut r = LittleEndianReader::new(Cursor::new(bytes));
        assert!(resync_to(&mut r, Anchor::Roster, 101, &options).is_err());
    }
}
