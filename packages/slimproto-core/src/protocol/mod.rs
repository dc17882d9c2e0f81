//! The slimproto wire protocol: framing, command construction, and HELO parsing.

pub mod codec;
pub mod command;
pub mod helo;
pub mod stat;

pub use codec::{read_client_frame, write_server_frame, ClientFrame};
pub use command::{
    build_audg_frame, build_strm_flush, build_strm_pause, build_strm_start, build_strm_status,
    build_strm_stop, build_strm_unpause, AudioFormat, AutostartMode, PcmChannels, PcmEndianness,
    PcmSampleRate, PcmSampleSize, SpdifMode, StreamCommand, StreamParams, TransitionType,
};
pub use helo::{parse_helo, DeviceClass, HeloInfo};
pub use stat::{is_full_stat_payload, parse_stat, StatFrame};
