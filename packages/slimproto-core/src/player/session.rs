//! Per-connection entity: identity, dynamic status, and the outbound write
//! half. Owns the state machine driven by inbound status frames.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex as AsyncMutex;

use crate::error::{SlimprotoError, SlimprotoResult};
use crate::player::info::PlayerInfo;
use crate::player::status::{PlayerState, PlayerStatus};
use crate::protocol::codec::write_server_frame;
use crate::protocol::command::{
    build_audg_frame, build_strm_flush, build_strm_pause, build_strm_start, build_strm_status,
    build_strm_stop, build_strm_unpause,
};
use crate::protocol::stat::StatFrame;
use crate::protocol_constants::DEFAULT_BUFFER_THRESHOLD_KB;
use crate::streaming_policy::resolve_format;

/// What effect an inbound `STAT` frame had on session state, so the caller
/// (the protocol server) knows which event, if any, to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatEffect {
    /// Buffer/timing fields updated; no state change, nothing to publish.
    None,
    /// Transport state changed; publish `PlayerStatus`.
    StatusChanged,
    /// Decoder reported track completion past the startup guard; publish
    /// `PlayerTrackFinished`.
    TrackFinished,
}

/// A single player's session: identity, dynamic status, and the write half
/// of its TCP connection.
///
/// The registry holds a shared `Arc<PlayerSession>` permitting concurrent
/// lookup and command dispatch; the owning session task holds the read
/// half separately and is the only reader.
pub struct PlayerSession {
    /// Static identity, fixed at HELO time.
    pub info: PlayerInfo,
    status: RwLock<PlayerStatus>,
    writer: AsyncMutex<Box<dyn AsyncWrite + Unpin + Send>>,
    closed: AtomicBool,
    /// Remote address of the TCP connection, used for `get_by_ip` lookups
    /// and as a display-name fallback.
    peer_ip: IpAddr,
    /// Advertised server IPv4 (big-endian u32) for this session's peer,
    /// computed once at accept time since it depends only on the peer
    /// address and the bind host, both fixed for the session's lifetime.
    advertise_ip: u32,
    /// Streaming port advertised in every `strm` frame sent to this player.
    streaming_port: u16,
}

impl PlayerSession {
    /// Creates a new session wrapping an already-registered writer half.
    #[must_use]
    pub fn new(
        info: PlayerInfo,
        writer: Box<dyn AsyncWrite + Unpin + Send>,
        peer_ip: IpAddr,
        advertise_ip: u32,
        streaming_port: u16,
    ) -> Self {
        Self {
            info,
            status: RwLock::new(PlayerStatus::default()),
            writer: AsyncMutex::new(writer),
            closed: AtomicBool::new(false),
            peer_ip,
            advertise_ip,
            streaming_port,
        }
    }

    /// Stable identity (MAC address).
    #[must_use]
    pub fn mac(&self) -> &str {
        &self.info.mac
    }

    /// Remote address of the TCP connection.
    #[must_use]
    pub fn peer_ip(&self) -> IpAddr {
        self.peer_ip
    }

    /// Returns a snapshot of the current dynamic status.
    #[must_use]
    pub fn status(&self) -> PlayerStatus {
        self.status.read().clone()
    }

    /// Refreshes `last_seen`. Called for every inbound frame, not only STAT.
    pub fn touch(&self) {
        self.status.write().touch();
    }

    /// Milliseconds since `last_seen`, or `0` if the clock moved backward.
    #[must_use]
    pub fn millis_since_seen(&self, now_millis: u64) -> u64 {
        now_millis.saturating_sub(self.status.read().last_seen)
    }

    /// Applies a decoded `STAT` frame to the state machine.
    pub fn apply_stat(&self, stat: &StatFrame) -> StatEffect {
        let mut status = self.status.write();
        status.touch();
        status.decoder_buffer_fullness = stat.decoder_buffer_fullness;
        status.elapsed_seconds = stat.elapsed_seconds;
        status.elapsed_milliseconds = stat.elapsed_milliseconds;
        status.signal_strength = stat.signal_strength;

        match &stat.event_code {
            b"STMr" => {
                status.state = PlayerState::Playing;
                StatEffect::StatusChanged
            }
            b"STMp" => {
                status.state = PlayerState::Paused;
                StatEffect::StatusChanged
            }
            b"STMs" => {
                status.state = PlayerState::Stopped;
                StatEffect::StatusChanged
            }
            b"STMt" => {
                if status.decoder_buffer_fullness > 0
                    && !matches!(status.state, PlayerState::Playing | PlayerState::Paused)
                {
                    status.state = PlayerState::Playing;
                }
                StatEffect::None
            }
            b"STMd" => {
                if stat.elapsed_seconds == 0 && stat.elapsed_milliseconds == 0 {
                    StatEffect::None
                } else {
                    StatEffect::TrackFinished
                }
            }
            _ => StatEffect::None,
        }
    }

    /// Sends a raw frame with an arbitrary tag, bypassing the `strm`/`audg`
    /// builders. Used for the post-HELO `vers`/`setd` greeting, which have no
    /// other caller.
    pub async fn send_raw(&self, tag: &[u8; 4], payload: &[u8]) -> SlimprotoResult<()> {
        self.write_frame(tag, payload).await
    }

    async fn write_frame(&self, tag: &[u8; 4], payload: &[u8]) -> SlimprotoResult<()> {
        let mut writer = self.writer.lock().await;
        match write_server_frame(&mut *writer, tag, payload).await {
            Ok(()) => Ok(()),
            Err(e) => {
                drop(writer);
                self.mark_disconnected();
                Err(SlimprotoError::Connection(e.to_string()))
            }
        }
    }

    fn mark_disconnected(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.status.write().state = PlayerState::Disconnected;
    }

    /// Sends `strm u` and sets state Playing.
    pub async fn play(&self) -> SlimprotoResult<()> {
        let frame = build_strm_unpause(0, self.streaming_port, self.advertise_ip);
        self.write_frame(b"strm", &frame).await?;
        self.status.write().state = PlayerState::Playing;
        Ok(())
    }

    /// Sends `strm p` and sets state Paused.
    pub async fn pause(&self) -> SlimprotoResult<()> {
        let frame = build_strm_pause(0, self.streaming_port, self.advertise_ip);
        self.write_frame(b"strm", &frame).await?;
        self.status.write().state = PlayerState::Paused;
        Ok(())
    }

    /// Sends `strm q` and sets state Stopped.
    pub async fn stop(&self) -> SlimprotoResult<()> {
        let frame = build_strm_stop(self.streaming_port, self.advertise_ip);
        self.write_frame(b"strm", &frame).await?;
        self.status.write().state = PlayerState::Stopped;
        Ok(())
    }

    /// Sends `strm f`. State is unchanged; used before a track switch.
    pub async fn flush(&self) -> SlimprotoResult<()> {
        let frame = build_strm_flush(self.streaming_port, self.advertise_ip);
        self.write_frame(b"strm", &frame).await
    }

    /// Sends `strm t`, the heartbeat/status-request frame. State is
    /// unchanged; the player's own `STMt` reply, if any, drives state.
    pub async fn send_heartbeat(&self) -> SlimprotoResult<()> {
        let frame = build_strm_status(self.streaming_port, self.advertise_ip);
        self.write_frame(b"strm", &frame).await
    }

    /// Paused -> play; Playing -> pause; otherwise -> play.
    pub async fn toggle_pause(&self) -> SlimprotoResult<()> {
        let state = self.status.read().state;
        match state {
            PlayerState::Paused => self.play().await,
            PlayerState::Playing => self.pause().await,
            _ => self.play().await,
        }
    }

    /// Clamps `volume` to `[0, 100]`, sends `audg`, and updates status.
    pub async fn set_volume(&self, volume: u8, muted: bool) -> SlimprotoResult<()> {
        let clamped = volume.min(100);
        let frame = build_audg_frame(clamped, muted, false, 0);
        self.write_frame(b"audg", &frame).await?;
        self.status.write().set_volume(clamped, muted);
        Ok(())
    }

    /// Raises volume by `step`, clamped at 100.
    pub async fn volume_up(&self, step: u8) -> SlimprotoResult<()> {
        let (current, muted) = {
            let status = self.status.read();
            (status.volume, status.muted)
        };
        self.set_volume(current.saturating_add(step).min(100), muted)
            .await
    }

    /// Lowers volume by `step`, clamped at 0.
    pub async fn volume_down(&self, step: u8) -> SlimprotoResult<()> {
        let (current, muted) = {
            let status = self.status.read();
            (status.volume, status.muted)
        };
        self.set_volume(current.saturating_sub(step), muted).await
    }

    /// Mutes, preserving the current volume for `unmute`.
    pub async fn mute(&self) -> SlimprotoResult<()> {
        let current = self.status.read().volume;
        self.set_volume(current, true).await
    }

    /// Unmutes, restoring the last non-zero volume.
    pub async fn unmute(&self) -> SlimprotoResult<()> {
        let restore = self.status.read().last_unmuted_volume;
        self.set_volume(restore, false).await
    }

    /// Resolves the effective format via the streaming-policy shim, sends
    /// `strm s`, and optimistically sets state Playing (the actual state is
    /// later confirmed by `STMr`).
    pub async fn start_stream(
        &self,
        track_path: &str,
        format_hint: &str,
        buffer_threshold_kb: Option<u8>,
    ) -> SlimprotoResult<()> {
        let resolved = resolve_format(format_hint, self.info.device_class);
        let request = format!(
            "GET {} HTTP/1.0\r\n\r\n",
            streaming_request_path(track_path, self.mac())
        );
        let frame = build_strm_start(
            resolved.format,
            resolved.self_describing_pcm,
            request.into_bytes(),
            buffer_threshold_kb.unwrap_or(DEFAULT_BUFFER_THRESHOLD_KB),
            self.streaming_port,
            self.advertise_ip,
        );
        self.write_frame(b"strm", &frame).await?;
        self.status.write().state = PlayerState::Playing;
        Ok(())
    }

    /// Closes the writer and marks the session Disconnected. Idempotent:
    /// repeated calls (or a call after a write failure already closed the
    /// session) are no-ops.
    pub async fn disconnect(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
        drop(writer);
        self.status.write().state = PlayerState::Disconnected;
    }
}

fn streaming_request_path(track_path: &str, mac: &str) -> String {
    if track_path.starts_with('/') || track_path.contains("://") {
        track_path.to_string()
    } else {
        format!("/stream.{track_path}?player={mac}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{parse_helo, DeviceClass};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::AsyncWrite;

    struct RecordingWriter {
        buf: Vec<u8>,
        fail: bool,
    }

    impl AsyncWrite for RecordingWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            if self.fail {
                return Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "broken",
                )));
            }
            self.buf.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn sample_info() -> PlayerInfo {
        let mut payload = vec![0x0C, 0x01, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
        payload.extend_from_slice(b"Name=Kitchen");
        let helo = parse_helo(&payload).unwrap();
        PlayerInfo::from_helo(helo, "1.2.3.4")
    }

    fn session_with(fail: bool) -> PlayerSession {
        PlayerSession::new(
            sample_info(),
            Box::new(RecordingWriter {
                buf: Vec::new(),
                fail,
            }),
            "127.0.0.1".parse().unwrap(),
            0x7F000001,
            9000,
        )
    }

    #[tokio::test]
    async fn pause_sends_frame_and_sets_paused() {
        let session = session_with(false);
        session.pause().await.unwrap();
        assert_eq!(session.status().state, PlayerState::Paused);
    }

    #[tokio::test]
    async fn write_failure_marks_disconnected() {
        let session = session_with(true);
        let err = session.pause().await.unwrap_err();
        assert!(matches!(err, SlimprotoError::Connection(_)));
        assert_eq!(session.status().state, PlayerState::Disconnected);
    }

    #[tokio::test]
    async fn toggle_pause_from_playing_pauses() {
        let session = session_with(false);
        session.play().await.unwrap();
        session.toggle_pause().await.unwrap();
        assert_eq!(session.status().state, PlayerState::Paused);
    }

    #[tokio::test]
    async fn set_volume_clamps_and_mute_preserves_volume() {
        let session = session_with(false);
        session.set_volume(80, false).await.unwrap();
        session.mute().await.unwrap();
        assert!(session.status().muted);
        session.unmute().await.unwrap();
        assert_eq!(session.status().volume, 80);
        assert!(!session.status().muted);
    }

    #[tokio::test]
    async fn volume_up_clamps_at_100() {
        let session = session_with(false);
        session.set_volume(98, false).await.unwrap();
        session.volume_up(5).await.unwrap();
        assert_eq!(session.status().volume, 100);
    }

    #[test]
    fn stmt_promotes_to_playing_when_buffered() {
        let session = session_with(false);
        let stat = StatFrame {
            event_code: *b"STMt",
            decoder_buffer_fullness: 8192,
            ..Default::default()
        };
        let effect = session.apply_stat(&stat);
        assert_eq!(effect, StatEffect::None);
        assert_eq!(session.status().state, PlayerState::Playing);
    }

    #[test]
    fn stmd_guarded_against_zero_elapsed() {
        let session = session_with(false);
        let stat = StatFrame {
            event_code: *b"STMd",
            elapsed_seconds: 0,
            elapsed_milliseconds: 0,
            ..Default::default()
        };
        assert_eq!(session.apply_stat(&stat), StatEffect::None);
    }

    #[test]
    fn stmd_fires_when_elapsed_nonzero() {
        let session = session_with(false);
        let stat = StatFrame {
            event_code: *b"STMd",
            elapsed_seconds: 1,
            ..Default::default()
        };
        assert_eq!(session.apply_stat(&stat), StatEffect::TrackFinished);
    }

    #[test]
    fn device_class_of_sample_is_squeeze_play() {
        assert_eq!(sample_info().device_class, DeviceClass::SqueezePlay);
    }
}
