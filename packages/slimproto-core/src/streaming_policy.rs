//! Streaming-policy shim: maps a format hint (plus device class, reserved
//! for future per-device transcoding decisions) to the `strm` format byte
//! and whether PCM fields should be self-describing.
//!
//! Server-side transcoding is signalled only by this shim returning a
//! different hint than the input; the `strm` frame must always advertise
//! the format the client will actually receive.

use crate::protocol::{AudioFormat, DeviceClass};

/// Resolved streaming format: the wire format byte, whether PCM parameters
/// should be self-describing, and the file extension a generated request
/// string should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFormat {
    /// The `strm` format byte to advertise.
    pub format: AudioFormat,
    /// Whether PCM sample size/rate/channels/endianness should be `?`.
    pub self_describing_pcm: bool,
    /// File extension to use in a generated stream request string.
    pub extension: &'static str,
}

/// Resolves a format hint (typically a file extension or container name)
/// plus device class into the format the `strm` frame should advertise.
///
/// `device_class` is currently unused by the policy but kept as an input so
/// future per-device transcoding decisions don't require a signature
/// change; today every device class is treated identically.
#[must_use]
pub fn resolve_format(format_hint: &str, _device_class: DeviceClass) -> ResolvedFormat {
    match format_hint.to_ascii_lowercase().as_str() {
        "flac" => ResolvedFormat {
            format: AudioFormat::Flac,
            self_describing_pcm: true,
            extension: "flac",
        },
        "wav" | "pcm" => ResolvedFormat {
            format: AudioFormat::Pcm,
            self_describing_pcm: true,
            extension: "wav",
        },
        "mp3" => ResolvedFormat {
            format: AudioFormat::Mp3,
            self_describing_pcm: true,
            extension: "mp3",
        },
        "ogg" => ResolvedFormat {
            format: AudioFormat::Ogg,
            self_describing_pcm: true,
            extension: "ogg",
        },
        _ => ResolvedFormat {
            format: AudioFormat::Mp3,
            self_describing_pcm: true,
            extension: "mp3",
        },
    }
}

/// Collaborator exposing the opaque, monotonically-increasing stream
/// generation counter maintained by the out-of-scope HTTP audio-streaming
/// service. The protocol server only reads from this; it never writes.
pub trait StreamGenerationSource: Send + Sync {
    /// Returns the current stream generation for `player_id`, if known.
    fn generation_of(&self, player_id: &str) -> Option<u64>;
}
