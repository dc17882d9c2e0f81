//! Static per-player identity, fixed at HELO time.

use std::collections::HashMap;

use crate::protocol::{DeviceClass, HeloInfo};

/// Static information about a player, derived once from its HELO handshake
/// and never mutated afterward.
#[derive(Debug, Clone)]
pub struct PlayerInfo {
    /// Stable identity: lowercase colon-separated MAC.
    pub mac: String,
    /// Device class derived from the HELO device ID.
    pub device_class: DeviceClass,
    /// Firmware revision byte, opaque.
    pub firmware_revision: u8,
    /// 32-character lowercase hex UUID, if the HELO payload carried one.
    pub uuid: Option<String>,
    /// Model name derived from the device class.
    pub model_name: String,
    /// Capability map parsed from the HELO capability string.
    pub capabilities: HashMap<String, String>,
    /// Display name: `Name` capability, else MAC, else `Player-<ip>`.
    pub display_name: String,
}

impl PlayerInfo {
    /// Builds a [`PlayerInfo`] from a parsed HELO payload and the peer's
    /// address, used only to synthesize a display name when neither a
    /// `Name` capability nor a MAC is available.
    #[must_use]
    pub fn from_helo(helo: HeloInfo, peer_addr_fallback: &str) -> Self {
        let model_name = helo.device_class.model_name();
        let display_name = helo.display_name(peer_addr_fallback);
        Self {
            mac: helo.mac,
            device_class: helo.device_class,
            firmware_revision: helo.firmware_revision,
            uuid: helo.uuid,
            model_name,
            capabilities: helo.capabilities,
            display_name,
        }
    }
}
