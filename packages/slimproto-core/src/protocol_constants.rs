//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by the slimproto wire protocol itself (or by the
//! reference server implementation clients expect byte-for-byte compatibility
//! with) and changing them would break compatibility with real players.

// ─────────────────────────────────────────────────────────────────────────────
// Listener
// ─────────────────────────────────────────────────────────────────────────────

/// Default TCP port the protocol server listens on.
pub const SLIMPROTO_PORT: u16 = 3483;

// ─────────────────────────────────────────────────────────────────────────────
// Framing
// ─────────────────────────────────────────────────────────────────────────────

/// Maximum accepted payload length for an inbound client->server frame.
///
/// A declared length greater than this is rejected as `FrameTooLarge`; a
/// length equal to this is accepted.
pub const MAX_FRAME_PAYLOAD: u32 = 65536;

/// Size in bytes of the client->server frame header (4-byte tag + 4-byte
/// big-endian length).
pub const CLIENT_FRAME_HEADER_SIZE: usize = 8;

/// Size in bytes of a wire tag (`strm`, `HELO`, `STAT`, ...).
pub const TAG_SIZE: usize = 4;

// ─────────────────────────────────────────────────────────────────────────────
// Command frame layouts
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed header size of an `strm` command frame, before any trailing request
/// string.
pub const STRM_FIXED_HEADER_SIZE: usize = 24;

/// Total size of an `audg` command frame.
pub const AUDG_FRAME_SIZE: usize = 18;

/// Minimum length of a HELO payload the parser will accept.
pub const HELO_MIN_PAYLOAD_SIZE: usize = 10;

/// HELO payload length at or above which a 16-byte UUID is present at
/// offset 8..24, shifting the capability string to offset 36.
pub const HELO_UUID_THRESHOLD: usize = 36;

/// Capability string offset when no UUID is present.
pub const HELO_CAPABILITIES_OFFSET_SHORT: usize = 20;

/// Capability string offset when a UUID is present.
pub const HELO_CAPABILITIES_OFFSET_EXTENDED: usize = 36;

/// Minimum STAT payload length carrying the full set of offsets this server
/// extracts. Shorter payloads are tolerated; missing fields default to 0.
pub const STAT_MIN_PAYLOAD_SIZE: usize = 36;

// ─────────────────────────────────────────────────────────────────────────────
// Handshake greeting
// ─────────────────────────────────────────────────────────────────────────────

/// Literal `vers` payload sent immediately after a successful HELO.
///
/// Real clients only check that this is present and well-formed ASCII; the
/// value is cosmetic but fixed for compatibility with server-version probes.
pub const SERVER_VERSION_STRING: &str = "8.5.0";

// ─────────────────────────────────────────────────────────────────────────────
// Liveness
// ─────────────────────────────────────────────────────────────────────────────

/// Deadline for receiving the first (HELO) frame on a newly accepted
/// connection.
pub const HELO_DEADLINE_SECS: u64 = 5;

/// Inactivity threshold past which a session is considered dead and evicted.
pub const CLIENT_TIMEOUT_SECS: u64 = 60;

/// Interval on which the heartbeat/timeout supervisor sweeps the registry.
///
/// Documented cadence for the heartbeat a player actually observes is 10s;
/// the supervisor itself wakes every `CLIENT_CHECK_INTERVAL_SECS` to check
/// for timeouts, which happens to also be the interval at which `strm t`
/// heartbeats go out.
pub const CLIENT_CHECK_INTERVAL_SECS: u64 = 5;

/// Documented heartbeat cadence from the player's point of view.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Streaming defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Default streaming port advertised in `strm` frames.
pub const DEFAULT_STREAMING_PORT: u16 = 9000;

/// Default decoder buffer threshold (KB) used by `start_stream`.
pub const DEFAULT_BUFFER_THRESHOLD_KB: u8 = 255;

/// Default volume step used by `volume_up`/`volume_down`.
pub const DEFAULT_VOLUME_STEP: u8 = 5;
