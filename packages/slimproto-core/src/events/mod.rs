//! Event system for publishing protocol-meaningful transitions.
//!
//! This module provides:
//! - [`EventEmitter`] trait so the protocol server can publish events without
//!   knowing how (or whether) anything downstream consumes them.
//! - [`BroadcastEvent`], the tagged union of everything the server publishes.
//!
//! The event bus itself (fan-out to subscribers, transport) is an external
//! collaborator; this crate only defines the contract.

mod emitter;

pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

use crate::player::PlayerState;

/// Events published by the protocol server at protocol-meaningful transitions.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BroadcastEvent {
    /// A player completed its HELO handshake and was registered.
    PlayerConnected {
        /// Stable player identity (MAC address).
        player_id: String,
        /// Display name derived from capabilities, MAC, or IP.
        name: String,
        /// Model name derived from the device class.
        model: String,
    },

    /// A player's session ended (clean `BYE!`, read failure, or timeout eviction).
    PlayerDisconnected {
        /// Stable player identity (MAC address).
        player_id: String,
    },

    /// A player reported (or was inferred to have entered) a new transport state.
    PlayerStatus {
        /// Stable player identity (MAC address).
        player_id: String,
        /// Current transport state.
        state: PlayerState,
        /// Current volume, 0-100.
        volume: u8,
        /// Whether the player is muted.
        muted: bool,
        /// Elapsed playback position, seconds.
        elapsed_seconds: u32,
        /// Elapsed playback position, milliseconds (sub-second remainder).
        elapsed_milliseconds: u32,
    },

    /// A track finished decoding, guarded against spurious start-of-stream noise.
    PlayerTrackFinished {
        /// Stable player identity (MAC address).
        player_id: String,
        /// Opaque stream generation from the streaming collaborator, if any.
        stream_generation: Option<u64>,
    },
}
