//! `STAT` frame parsing: dynamic status updates from the player.
//!
//! The reference layout mixes field sizes that don't sum cleanly (e.g. a
//! 2-byte voltage sandwiched between timing fields at offsets that aren't
//! contiguous with the fields before them). The offsets below are
//! authoritative; any payload shorter than a given offset defaults that
//! field to 0 rather than erroring.

use crate::protocol_constants::STAT_MIN_PAYLOAD_SIZE;

/// A decoded `STAT` payload.
#[derive(Debug, Clone, Default)]
pub struct StatFrame {
    /// 4-byte event code, e.g. `STMr`, `STMt`, `STMd`.
    pub event_code: [u8; 4],
    /// Decoder buffer fullness, bytes.
    pub decoder_buffer_fullness: u32,
    /// Total bytes received so far this stream.
    pub bytes_received: u64,
    /// Radio/wifi signal strength.
    pub signal_strength: u16,
    /// Elapsed playback position, seconds.
    pub elapsed_seconds: u32,
    /// Elapsed playback position, milliseconds (sub-second remainder).
    pub elapsed_milliseconds: u32,
}

impl StatFrame {
    /// Returns the event code as a `&str` if valid ASCII.
    #[must_use]
    pub fn event_str(&self) -> String {
        std::str::from_utf8(&self.event_code)
            .map(str::to_string)
            .unwrap_or_else(|_| format!("{:?}", self.event_code))
    }
}

fn read_u16(payload: &[u8], offset: usize) -> u16 {
    if payload.len() >= offset + 2 {
        u16::from_be_bytes([payload[offset], payload[offset + 1]])
    } else {
        0
    }
}

fn read_u32(payload: &[u8], offset: usize) -> u32 {
    if payload.len() >= offset + 4 {
        u32::from_be_bytes(payload[offset..offset + 4].try_into().unwrap())
    } else {
        0
    }
}

fn read_u64(payload: &[u8], offset: usize) -> u64 {
    if payload.len() >= offset + 8 {
        u64::from_be_bytes(payload[offset..offset + 8].try_into().unwrap())
    } else {
        0
    }
}

/// Parses a `STAT` payload. Never fails: every field beyond the payload's
/// actual length silently defaults to 0, and a payload shorter than 4 bytes
/// yields an all-zero event code.
#[must_use]
pub fn parse_stat(payload: &[u8]) -> StatFrame {
    let mut event_code = [0u8; 4];
    let copy_len = payload.len().min(4);
    event_code[..copy_len].copy_from_slice(&payload[..copy_len]);

    StatFrame {
        event_code,
        decoder_buffer_fullness: read_u32(payload, 11),
        bytes_received: read_u64(payload, 15),
        signal_strength: read_u16(payload, 23),
        elapsed_seconds: read_u32(payload, 37),
        elapsed_milliseconds: read_u32(payload, 43),
    }
}

/// Whether `payload` carries the full set of fields this module extracts.
#[must_use]
pub fn is_full_stat_payload(payload: &[u8]) -> bool {
    payload.len() >= STAT_MIN_PAYLOAD_SIZE
}
