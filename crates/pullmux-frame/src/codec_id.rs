//! Codec identifiers understood by the PMX container.
//!
//! Identifiers 0-255 are reserved for well-known codecs.
//! Identifiers 256 and above are available for application-defined codecs.

/// No codec / unknown payload.
pub const NONE: u32 = 0;

pub const H264: u32 = 1;
pub const HEVC: u32 = 2;
pub const VP9: u32 = 3;
pub const AV1: u32 = 4;
pub const AAC: u32 = 5;
pub const OPUS: u32 = 6;
pub const FLAC: u32 = 7;
pub const PCM_S16LE: u32 = 8;

/// First application-defined codec identifier.
pub const USER_CODEC_START: u32 = 256;

static KNOWN: [(u32, &str); 8] = [
    (H264, "h264"),
    (HEVC, "hevc"),
    (VP9, "vp9"),
    (AV1, "av1"),
    (AAC, "aac"),
    (OPUS, "opus"),
    (FLAC, "flac"),
    (PCM_S16LE, "pcm_s16le"),
];

/// Returns the canonical short name for a codec identifier.
pub fn codec_name(id: u32) -> &'static str {
    match KNOWN.iter().find(|(known, _)| *known == id) {
        Some((_, name)) => *name,
        None if id == NONE => "none",
        None if id < USER_CODEC_START => "reserved",
        None => "user",
    }
}

/// Looks up a codec identifier by its short name (case-insensitive).
pub fn codec_id_from_name(name: &str) -> Option<u32> {
    KNOWN
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(name))
        .map(|(id, _)| *id)
}

/// Returns true if the identifier is in the reserved range.
pub fn is_reserved(id: u32) -> bool {
    id < USER_CODEC_START
}
