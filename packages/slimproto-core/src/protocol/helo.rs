//! HELO handshake payload parsing.
//!
//! HELO is the mandatory first frame from a player, carrying device
//! identity. Layout:
//!
//! ```text
//! [0]     device ID (u8)
//! [1]     firmware revision (u8)
//! [2..8]  MAC address (6 bytes)
//! [8..24] UUID (16 bytes, present only if payload >= 36)
//! [capabilities_offset..] capability string, ASCII, comma-separated
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::error::HandshakeError;
use crate::protocol_constants::{
    HELO_CAPABILITIES_OFFSET_EXTENDED, HELO_CAPABILITIES_OFFSET_SHORT, HELO_MIN_PAYLOAD_SIZE,
    HELO_UUID_THRESHOLD,
};

/// Known Squeezebox-family device classes.
///
/// Mirrors the `DEVICE_IDS` table every slimproto server implementation
/// ships, since device ID is not self-describing beyond this fixed mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// ID 2.
    Squeezebox,
    /// ID 3.
    SoftSqueeze,
    /// ID 4.
    Squeezebox2,
    /// ID 5.
    Transporter,
    /// ID 6.
    SoftSqueeze3,
    /// ID 7.
    Receiver,
    /// ID 8.
    SqueezeSlave,
    /// ID 9.
    Controller,
    /// ID 10.
    Boom,
    /// ID 11.
    SoftBoom,
    /// ID 12.
    SqueezePlay,
    /// Any device ID not in the table above, including 0 and 1 (slimp3 has
    /// no entry in the reference device-ID table).
    Unknown(u8),
}

impl DeviceClass {
    /// Maps a raw device ID byte to its device class.
    #[must_use]
    pub fn from_id(id: u8) -> Self {
        match id {
            2 => Self::Squeezebox,
            3 => Self::SoftSqueeze,
            4 => Self::Squeezebox2,
            5 => Self::Transporter,
            6 => Self::SoftSqueeze3,
            7 => Self::Receiver,
            8 => Self::SqueezeSlave,
            9 => Self::Controller,
            10 => Self::Boom,
            11 => Self::SoftBoom,
            12 => Self::SqueezePlay,
            other => Self::Unknown(other),
        }
    }

    /// Returns the model name string for this device class.
    #[must_use]
    pub fn model_name(&self) -> String {
        match self {
            Self::Squeezebox => "squeezebox".to_string(),
            Self::SoftSqueeze => "softsqueeze".to_string(),
            Self::Squeezebox2 => "squeezebox2".to_string(),
            Self::Transporter => "transporter".to_string(),
            Self::SoftSqueeze3 => "softsqueeze3".to_string(),
            Self::Receiver => "receiver".to_string(),
            Self::SqueezeSlave => "squeezeslave".to_string(),
            Self::Controller => "controller".to_string(),
            Self::Boom => "boom".to_string(),
            Self::SoftBoom => "softboom".to_string(),
            Self::SqueezePlay => "squeezeplay".to_string(),
            Self::Unknown(id) => format!("unknown-{id}"),
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.model_name())
    }
}

/// Everything the HELO parser extracts from the handshake payload.
#[derive(Debug, Clone)]
pub struct HeloInfo {
    /// Device class derived from the device ID byte.
    pub device_class: DeviceClass,
    /// Firmware revision byte, opaque.
    pub firmware_revision: u8,
    /// Stable identity: lowercase colon-separated MAC, e.g. `aa:bb:cc:dd:ee:ff`.
    pub mac: String,
    /// 32-character lowercase hex UUID, if the payload carried one.
    pub uuid: Option<String>,
    /// Parsed capability map. Bare flags are stored as `"1"`.
    pub capabilities: HashMap<String, String>,
}

impl HeloInfo {
    /// Display name resolution: `Name` capability, else MAC, else a
    /// synthesized placeholder from the caller-supplied fallback (typically
    /// the peer IP).
    #[must_use]
    pub fn display_name(&self, fallback_suffix: &str) -> String {
        if let Some(name) = self.capabilities.get("Name") {
            if !name.is_empty() {
                return name.clone();
            }
        }
        if !self.mac.is_empty() {
            return self.mac.clone();
        }
        format!("Player-{fallback_suffix}")
    }
}

fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn format_uuid(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parses a comma-separated capability string into a map.
///
/// Each token is either `Key=Value` (split on the first `=`; the value may
/// itself contain `=`) or a bare `Flag`, stored as `Flag -> "1"`.
#[must_use]
pub fn parse_capabilities(raw: &str) -> HashMap<String, String> {
    let mut caps = HashMap::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.split_once('=') {
            Some((key, value)) => {
                caps.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => {
                caps.insert(token.to_string(), "1".to_string());
            }
        }
    }
    caps
}

/// Parses a HELO payload into [`HeloInfo`].
///
/// # Errors
///
/// Returns [`HandshakeError::PayloadTooShort`] if `payload` is shorter than
/// [`HELO_MIN_PAYLOAD_SIZE`].
pub fn parse_helo(payload: &[u8]) -> Result<HeloInfo, HandshakeError> {
    if payload.len() < HELO_MIN_PAYLOAD_SIZE {
        return Err(HandshakeError::PayloadTooShort(payload.len()));
    }

    let device_class = DeviceClass::from_id(payload[0]);
    let firmware_revision = payload[1];
    let mac = format_mac(&payload[2..8]);

    let (uuid, capabilities_offset) = if payload.len() >= HELO_UUID_THRESHOLD {
        (
            Some(format_uuid(&payload[8..24])),
            HELO_CAPABILITIES_OFFSET_EXTENDED,
        )
    } else {
        (None, HELO_CAPABILITIES_OFFSET_SHORT)
    };

    let capabilities = if payload.len() > capabilities_offset {
        let raw = String::from_utf8_lossy(&payload[capabilities_offset..]);
        parse_capabilities(&raw)
    } else {
        HashMap::new()
    };

    Ok(HeloInfo {
        device_class,
        firmware_revision,
        mac,
        uuid,
        capabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> Vec<u8> {
        let mut payload = vec![0x0C, 0x01, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
        payload.extend_from_slice(b"Name=Kitchen,Firmware");
        payload
    }

    #[test]
    fn mac_is_lowercase_colon_separated() {
        let info = parse_helo(&sample_payload()).unwrap();
        assert_eq!(info.mac, "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn device_id_12_is_squeeze_play() {
        let info = parse_helo(&sample_payload()).unwrap();
        assert_eq!(info.device_class, DeviceClass::SqueezePlay);
    }

    #[test]
    fn unknown_device_id_yields_unknown_model() {
        let mut payload = vec![200, 0, 0, 0, 0, 0, 0, 0];
        payload.extend_from_slice(b"pad");
        let info = parse_helo(&payload).unwrap();
        assert_eq!(info.device_class.model_name(), "unknown-200");
    }

    #[test]
    fn payload_shorter_than_10_bytes_is_rejected() {
        let payload = vec![0u8; 3];
        assert!(matches!(
            parse_helo(&payload),
            Err(HandshakeError::PayloadTooShort(3))
        ));
    }

    #[test]
    fn uuid_present_only_when_payload_at_least_36_bytes() {
        let short = sample_payload();
        assert!(parse_helo(&short).unwrap().uuid.is_none());

        let mut extended = vec![0x0C, 0x01, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
        extended.extend_from_slice(&[0u8; 16]);
        extended.extend_from_slice(b"Name=Kitchen");
        let info = parse_helo(&extended).unwrap();
        assert_eq!(info.uuid.unwrap().len(), 32);
    }

    #[test]
    fn bare_flag_capability_becomes_flag_equals_1() {
        let caps = parse_capabilities("HasDigitalOut,Name=Kitchen");
        assert_eq!(caps.get("HasDigitalOut"), Some(&"1".to_string()));
    }

    #[test]
    fn capability_value_with_embedded_equals_splits_on_first() {
        let caps = parse_capabilities("K=V=W");
        assert_eq!(caps.get("K"), Some(&"V=W".to_string()));
    }

    #[test]
    fn display_name_prefers_name_capability() {
        let info = parse_helo(&sample_payload()).unwrap();
        assert_eq!(info.display_name("1.2.3.4"), "Kitchen");
    }

    #[test]
    fn display_name_falls_back_to_mac_then_synthesized() {
        let mut payload = vec![0x0C, 0x01, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
        payload.extend_from_slice(b"pad");
        let info = parse_helo(&payload).unwrap();
        assert_eq!(info.display_name("1.2.3.4"), "aa:bb:cc:dd:ee:ff");
    }
}
