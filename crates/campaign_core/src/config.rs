use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_PLAUSIBLE_COUNT: i32 = 1000;
pub const DEFAULT_RESYNC_WINDOW: u64 = 16 * 1024;
pub const DEFAULT_RESYNC_MAX_COUNT: i32 = 15;
pub const DEFAULT_RESYNC_MAX_TAG_LEN: u32 = 64;

/// Tunables for body decoding and writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecOptions {
    /// Counts above this are treated as a lost stream position.
    pub max_plausible_count: i32,
    /// Bytes the resync scanner may walk past its starting point.
    pub resync_window: u64,
    /// Largest list count accepted at a candidate resync point.
    pub resync_max_count: i32,
    /// Longest tag string considered at a candidate resync point.
    pub resync_max_tag_len: u32,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_plausible_count: DEFAULT_MAX_PLAUSIBLE_COUNT,
            resync_window: DEFAULT_RESYNC_WINDOW,
            resync_max_count: DEFAULT_RESYNC_MAX_COUNT,
            resync_max_tag_len: DEFAULT_RESYNC_MAX_TAG_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CodecOptions;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts: CodecOptions = serde_json::from_str(r#"{"resync_window": 512}"#).unwrap();
        assert_eq!(opts.resync_window, 512);
        assert_eq!(opts.max_plausible_count, 1000);
        assert_eq!(opts.resync_max_count, 15);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed = serde_json::from_str::<CodecOptions>(r#"{"resync_windw": 512}"#);
        assert!(parsed.is_err());
    }
}
