//! Command frame construction: the 24-byte `strm` stream-control header and
//! the 18-byte `audg` audio-gain frame.
//!
//! Every byte in these layouts is semantically significant and fixed by the
//! wire protocol; see the module-level doc for field offsets.

use crate::error::ArgumentError;

/// `strm` action byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCommand {
    /// `s` - start a new stream.
    Start,
    /// `p` - pause.
    Pause,
    /// `u` - unpause.
    Unpause,
    /// `q` - stop.
    Stop,
    /// `f` - flush (used before a track switch).
    Flush,
    /// `t` - status request (heartbeat).
    Status,
    /// `a` - skip/autostart-at-position. Reserved: no builder or consumer
    /// uses this action in this core.
    Skip,
}

impl StreamCommand {
    fn as_byte(self) -> u8 {
        match self {
            Self::Start => b's',
            Self::Pause => b'p',
            Self::Unpause => b'u',
            Self::Stop => b'q',
            Self::Flush => b'f',
            Self::Status => b't',
            Self::Skip => b'a',
        }
    }
}

/// `strm` autostart byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutostartMode {
    /// `0` - do not autostart; caller sends an explicit unpause.
    Off,
    /// `1` - autostart once buffered.
    Auto,
    /// `2` - direct streaming, no autostart.
    Direct,
    /// `3` - direct streaming with autostart.
    DirectAuto,
}

impl AutostartMode {
    fn as_byte(self) -> u8 {
        match self {
            Self::Off => b'0',
            Self::Auto => b'1',
            Self::Direct => b'2',
            Self::DirectAuto => b'3',
        }
    }
}

/// `strm` format byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// `m` MP3.
    Mp3,
    /// `p` PCM.
    Pcm,
    /// `f` FLAC.
    Flac,
    /// `o` Ogg.
    Ogg,
    /// `a` AAC.
    Aac,
    /// `w` WMA.
    Wma,
    /// `l` ALAC.
    Alac,
    /// `d` DSD.
    Dsd,
    /// `?` unknown/self-describing.
    Unknown,
}

impl AudioFormat {
    fn as_byte(self) -> u8 {
        match self {
            Self::Mp3 => b'm',
            Self::Pcm => b'p',
            Self::Flac => b'f',
            Self::Ogg => b'o',
            Self::Aac => b'a',
            Self::Wma => b'w',
            Self::Alac => b'l',
            Self::Dsd => b'd',
            Self::Unknown => b'?',
        }
    }
}

/// `strm` PCM sample size byte (`0..3`, or `?` self-describing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmSampleSize {
    /// 8-bit.
    Bits8,
    /// 16-bit.
    Bits16,
    /// 24-bit.
    Bits24,
    /// 32-bit.
    Bits32,
    /// Self-describing (container carries the size).
    SelfDescribing,
}

impl PcmSampleSize {
    fn as_byte(self) -> u8 {
        match self {
            Self::Bits8 => b'0',
            Self::Bits16 => b'1',
            Self::Bits24 => b'2',
            Self::Bits32 => b'3',
            Self::SelfDescribing => b'?',
        }
    }
}

/// `strm` PCM sample rate byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmSampleRate {
    /// 11025 Hz.
    Hz11025,
    /// 22050 Hz.
    Hz22050,
    /// 32000 Hz.
    Hz32000,
    /// 44100 Hz.
    Hz44100,
    /// 48000 Hz.
    Hz48000,
    /// 8000 Hz.
    Hz8000,
    /// 12000 Hz.
    Hz12000,
    /// 16000 Hz.
    Hz16000,
    /// 24000 Hz.
    Hz24000,
    /// 96000 Hz.
    Hz96000,
    /// Self-describing.
    SelfDescribing,
}

impl PcmSampleRate {
    fn as_byte(self) -> u8 {
        match self {
            Self::Hz11025 => b'0',
            Self::Hz22050 => b'1',
            Self::Hz32000 => b'2',
            Self::Hz44100 => b'3',
            Self::Hz48000 => b'4',
            Self::Hz8000 => b'5',
            Self::Hz12000 => b'6',
            Self::Hz16000 => b'7',
            Self::Hz24000 => b'8',
            Self::Hz96000 => b'9',
            Self::SelfDescribing => b'?',
        }
    }
}

/// `strm` PCM channels byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmChannels {
    /// Mono.
    Mono,
    /// Stereo.
    Stereo,
    /// Self-describing.
    SelfDescribing,
}

impl PcmChannels {
    fn as_byte(self) -> u8 {
        match self {
            Self::Mono => b'1',
            Self::Stereo => b'2',
            Self::SelfDescribing => b'?',
        }
    }
}

/// `strm` PCM endianness byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmEndianness {
    /// Big-endian.
    Big,
    /// Little-endian.
    Little,
    /// Self-describing.
    SelfDescribing,
}

impl PcmEndianness {
    fn as_byte(self) -> u8 {
        match self {
            Self::Big => b'0',
            Self::Little => b'1',
            Self::SelfDescribing => b'?',
        }
    }
}

/// `strm` transition type byte (`0..5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionType {
    /// No transition.
    None,
    /// Crossfade.
    Crossfade,
    /// Fade in.
    FadeIn,
    /// Fade out.
    FadeOut,
    /// Fade in and out.
    FadeInOut,
    /// Crossfade, but only if the track already ended.
    CrossfadeOnEnd,
}

impl TransitionType {
    fn as_byte(self) -> u8 {
        match self {
            Self::None => b'0',
            Self::Crossfade => b'1',
            Self::FadeIn => b'2',
            Self::FadeOut => b'3',
            Self::FadeInOut => b'4',
            Self::CrossfadeOnEnd => b'5',
        }
    }
}

/// `strm` SPDIF mode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpdifMode {
    /// Auto.
    Auto,
    /// Force on.
    On,
    /// Force off.
    Off,
}

impl SpdifMode {
    fn as_byte(self) -> u8 {
        match self {
            Self::Auto => 0,
            Self::On => 1,
            Self::Off => 2,
        }
    }
}

/// `strm` flag bits (byte offset 11).
pub mod strm_flags {
    /// Loop infinitely.
    pub const LOOP_INFINITE: u8 = 0x80;
    /// Do not restart the decoder between tracks.
    pub const NO_RESTART_DECODER: u8 = 0x40;
    /// Use SSL for the client's HTTP connect-back.
    pub const USE_SSL: u8 = 0x20;
    /// Stream is sent via the direct-protocol path.
    pub const DIRECT_PROTOCOL: u8 = 0x10;
    /// Play only the right channel, downmixed to mono.
    pub const MONO_RIGHT: u8 = 0x08;
    /// Play only the left channel, downmixed to mono.
    pub const MONO_LEFT: u8 = 0x04;
    /// Invert the right channel's polarity.
    pub const INVERT_RIGHT: u8 = 0x02;
    /// Invert the left channel's polarity.
    pub const INVERT_LEFT: u8 = 0x01;
}

/// Parameters for a fully general `strm` frame.
///
/// Most callers should use the convenience builders
/// ([`build_strm_start`], [`build_strm_pause`], ...) instead of constructing
/// this directly.
#[derive(Debug, Clone)]
pub struct StreamParams {
    /// Action byte.
    pub command: StreamCommand,
    /// Autostart byte.
    pub autostart: AutostartMode,
    /// Format byte.
    pub format: AudioFormat,
    /// PCM sample size byte.
    pub pcm_sample_size: PcmSampleSize,
    /// PCM sample rate byte.
    pub pcm_sample_rate: PcmSampleRate,
    /// PCM channels byte.
    pub pcm_channels: PcmChannels,
    /// PCM endianness byte.
    pub pcm_endianness: PcmEndianness,
    /// Decoder buffer threshold, KB.
    pub buffer_threshold_kb: u8,
    /// SPDIF mode.
    pub spdif_mode: SpdifMode,
    /// Transition duration, seconds.
    pub transition_duration_secs: u8,
    /// Transition type.
    pub transition_type: TransitionType,
    /// Flag bitfield (see [`strm_flags`]).
    pub flags: u8,
    /// Output buffer threshold, tenths of a second.
    pub output_threshold_tenths: u8,
    /// Number of slave streams (synchronized group playback).
    pub slave_streams: u8,
    /// Replay gain (16.16 fixed point) for `start`, or a millisecond
    /// interval for `pause`/`unpause`.
    pub replay_gain_or_interval: u32,
    /// Server port the client should connect back to.
    pub server_port: u16,
    /// Server IPv4 address the client should connect back to, as a
    /// big-endian u32.
    pub server_ip: u32,
    /// Trailing request string (e.g. the HTTP GET line for `start`).
    pub request: Vec<u8>,
}

/// Packs a `strm` frame: the 24-byte fixed header followed by the optional
/// trailing request string.
#[must_use]
pub fn build_strm_frame(params: &StreamParams) -> Vec<u8> {
    let mut buf = Vec::with_capacity(24 + params.request.len());
    buf.push(params.command.as_byte());
    buf.push(params.autostart.as_byte());
    buf.push(params.format.as_byte());
    buf.push(params.pcm_sample_size.as_byte());
    buf.push(params.pcm_sample_rate.as_byte());
    buf.push(params.pcm_channels.as_byte());
    buf.push(params.pcm_endianness.as_byte());
    buf.push(params.buffer_threshold_kb);
    buf.push(params.spdif_mode.as_byte());
    buf.push(params.transition_duration_secs);
    buf.push(params.transition_type.as_byte());
    buf.push(params.flags);
    buf.push(params.output_threshold_tenths);
    buf.push(params.slave_streams);
    buf.extend_from_slice(&params.replay_gain_or_interval.to_be_bytes());
    buf.extend_from_slice(&params.server_port.to_be_bytes());
    buf.extend_from_slice(&params.server_ip.to_be_bytes());
    debug_assert_eq!(buf.len(), 24);
    buf.extend_from_slice(&params.request);
    buf
}

fn base_params(
    command: StreamCommand,
    autostart: AutostartMode,
    format: AudioFormat,
    server_port: u16,
    server_ip: u32,
) -> StreamParams {
    StreamParams {
        command,
        autostart,
        format,
        pcm_sample_size: PcmSampleSize::SelfDescribing,
        pcm_sample_rate: PcmSampleRate::SelfDescribing,
        pcm_channels: PcmChannels::SelfDescribing,
        pcm_endianness: PcmEndianness::SelfDescribing,
        buffer_threshold_kb: 0,
        spdif_mode: SpdifMode::Auto,
        transition_duration_secs: 0,
        transition_type: TransitionType::None,
        flags: 0,
        output_threshold_tenths: 0,
        slave_streams: 0,
        replay_gain_or_interval: 0,
        server_port,
        server_ip,
        request: Vec::new(),
    }
}

/// Builds a `strm s` (start) frame.
///
/// `format` and whether PCM fields are self-describing should already be
/// resolved by the streaming-policy shim before calling this.
#[must_use]
pub fn build_strm_start(
    format: AudioFormat,
    self_describing_pcm: bool,
    request: Vec<u8>,
    buffer_threshold_kb: u8,
    server_port: u16,
    server_ip: u32,
) -> Vec<u8> {
    let mut params = base_params(
        StreamCommand::Start,
        AutostartMode::Auto,
        format,
        server_port,
        server_ip,
    );
    if !self_describing_pcm {
        params.pcm_sample_size = PcmSampleSize::Bits16;
        params.pcm_sample_rate = PcmSampleRate::Hz44100;
        params.pcm_channels = PcmChannels::Stereo;
        params.pcm_endianness = PcmEndianness::Big;
    }
    params.buffer_threshold_kb = buffer_threshold_kb;
    params.request = request;
    build_strm_frame(&params)
}

/// Builds a `strm p` (pause) frame, with an optional millisecond timestamp
/// stored in the replay-gain/interval slot.
#[must_use]
pub fn build_strm_pause(interval_ms: u32, server_port: u16, server_ip: u32) -> Vec<u8> {
    let mut params = base_params(
        StreamCommand::Pause,
        AutostartMode::Off,
        AudioFormat::Mp3,
        server_port,
        server_ip,
    );
    params.replay_gain_or_interval = interval_ms;
    build_strm_frame(&params)
}

/// Builds a `strm u` (unpause) frame, with an optional millisecond timestamp
/// stored in the replay-gain/interval slot.
#[must_use]
pub fn build_strm_unpause(interval_ms: u32, server_port: u16, server_ip: u32) -> Vec<u8> {
    let mut params = base_params(
        StreamCommand::Unpause,
        AutostartMode::Off,
        AudioFormat::Mp3,
        server_port,
        server_ip,
    );
    params.replay_gain_or_interval = interval_ms;
    build_strm_frame(&params)
}

/// Builds a `strm q` (stop) frame.
#[must_use]
pub fn build_strm_stop(server_port: u16, server_ip: u32) -> Vec<u8> {
    build_strm_frame(&base_params(
        StreamCommand::Stop,
        AutostartMode::Off,
        AudioFormat::Mp3,
        server_port,
        server_ip,
    ))
}

/// Builds a `strm f` (flush) frame.
#[must_use]
pub fn build_strm_flush(server_port: u16, server_ip: u32) -> Vec<u8> {
    build_strm_frame(&base_params(
        StreamCommand::Flush,
        AutostartMode::Off,
        AudioFormat::Mp3,
        server_port,
        server_ip,
    ))
}

/// Builds a `strm t` (status request / heartbeat) frame.
///
/// `server_port`/`server_ip` must be a reachable advertised address, never
/// `0`/`0.0.0.0` — this is the frame real clients use to decide where to
/// connect back for audio.
#[must_use]
pub fn build_strm_status(server_port: u16, server_ip: u32) -> Vec<u8> {
    build_strm_frame(&base_params(
        StreamCommand::Status,
        AutostartMode::Off,
        AudioFormat::Mp3,
        server_port,
        server_ip,
    ))
}

/// Converts a volume/mute pair into the 16.16 fixed point gain this
/// protocol expects: `muted ? 0 : round((v/100) * 256) << 8`.
#[must_use]
pub fn volume_to_gain(volume: u8, muted: bool) -> u32 {
    if muted {
        return 0;
    }
    let scaled = (f64::from(volume) / 100.0 * 256.0).round() as u32;
    scaled << 8
}

/// Builds an `audg` (audio gain / volume) frame.
///
/// Layout: two deprecated zero u32 fields, a `digital_volume` flag byte, a
/// preamp byte, then left and right gain as big-endian u32 16.16 fixed
/// point. `build_volume_frame`-style callers always pass equal left/right
/// gain.
#[must_use]
pub fn build_audg_frame(volume: u8, muted: bool, digital_volume: bool, preamp: u8) -> Vec<u8> {
    let gain = volume_to_gain(volume, muted);
    let mut buf = Vec::with_capacity(18);
    buf.extend_from_slice(&0u32.to_be_bytes());
    buf.extend_from_slice(&0u32.to_be_bytes());
    buf.push(u8::from(digital_volume));
    buf.push(preamp);
    buf.extend_from_slice(&gain.to_be_bytes());
    buf.extend_from_slice(&gain.to_be_bytes());
    debug_assert_eq!(buf.len(), 18);
    buf
}

/// Validates that a wire tag is exactly 4 bytes, for callers building tags
/// from caller-supplied strings rather than literals.
pub fn validate_tag(tag: &[u8]) -> Result<[u8; 4], ArgumentError> {
    tag.try_into()
        .map_err(|_| ArgumentError::InvalidTagLength(tag.len()))
}
