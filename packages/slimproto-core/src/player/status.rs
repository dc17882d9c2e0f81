//! Dynamic per-player status, mutated by inbound frames and command methods.

use serde::Serialize;

use crate::utils::now_millis;

/// Transport state of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// No active session (used only transiently; disconnected sessions are
    /// removed from the registry rather than kept in this state).
    Disconnected,
    /// Registered but not yet playing.
    Connected,
    /// Actively playing.
    Playing,
    /// Paused mid-track.
    Paused,
    /// Stopped.
    Stopped,
}

/// Dynamic status of a player, updated as frames arrive.
#[derive(Debug, Clone)]
pub struct PlayerStatus {
    /// Current transport state.
    pub state: PlayerState,
    /// Volume, clamped to `[0, 100]`.
    pub volume: u8,
    /// Whether the player is muted.
    pub muted: bool,
    /// Volume to restore on `unmute`, preserved across mute/unmute cycles.
    pub last_unmuted_volume: u8,
    /// Elapsed playback position, seconds.
    pub elapsed_seconds: u32,
    /// Elapsed playback position, milliseconds (sub-second remainder).
    pub elapsed_milliseconds: u32,
    /// Decoder buffer fullness, bytes.
    pub decoder_buffer_fullness: u32,
    /// Output buffer fullness, bytes.
    pub output_buffer_fullness: u32,
    /// Radio/wifi signal strength.
    pub signal_strength: u16,
    /// Wall-clock timestamp (Unix millis) of the last inbound frame.
    pub last_seen: u64,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self {
            state: PlayerState::Connected,
            volume: 50,
            muted: false,
            last_unmuted_volume: 50,
            elapsed_seconds: 0,
            elapsed_milliseconds: 0,
            decoder_buffer_fullness: 0,
            output_buffer_fullness: 0,
            signal_strength: 0,
            last_seen: now_millis(),
        }
    }
}

impl PlayerStatus {
    /// Refreshes `last_seen` to the current time. `last_seen` is
    /// monotonically non-decreasing within a session since `now_millis` is
    /// wall-clock and calls only move forward.
    pub fn touch(&mut self) {
        let now = now_millis();
        if now > self.last_seen {
            self.last_seen = now;
        }
    }

    /// Clamps and sets volume, updating mute bookkeeping.
    pub fn set_volume(&mut self, volume: u8, muted: bool) {
        let clamped = volume.min(100);
        self.volume = clamped;
        self.muted = muted;
        if !muted && clamped > 0 {
            self.last_unmuted_volume = clamped;
        }
    }
}
