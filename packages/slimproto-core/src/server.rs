//! The protocol server: listener, accept loop, handshake orchestration,
//! per-session dispatch, and the heartbeat/timeout supervisor.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::error::{FrameError, HandshakeError, SlimprotoResult};
use crate::events::{BroadcastEvent, EventEmitter};
use crate::player::{PlayerInfo, PlayerSession, StatEffect};
use crate::protocol::codec::read_client_frame;
use crate::protocol::helo::parse_helo;
use crate::protocol::stat::parse_stat;
use crate::protocol_constants::{
    CLIENT_CHECK_INTERVAL_SECS, CLIENT_TIMEOUT_SECS, DEFAULT_STREAMING_PORT, HELO_DEADLINE_SECS,
    SERVER_VERSION_STRING, SLIMPROTO_PORT,
};
use crate::registry::PlayerRegistry;
use crate::runtime::TaskSpawner;
use crate::streaming_policy::StreamGenerationSource;

/// Configuration for a [`ProtocolServer`] instance.
#[derive(Debug, Clone)]
pub struct ProtocolServerConfig {
    /// Address to bind the listener to.
    pub bind_host: IpAddr,
    /// Port to bind the listener to.
    pub bind_port: u16,
    /// Port advertised in `strm.server_port` for clients to connect back to
    /// for audio.
    pub streaming_port: u16,
    /// Explicit advertised IPv4, overriding auto-detection.
    pub advertise_ip: Option<IpAddr>,
    /// Inactivity threshold past which a session is evicted.
    pub client_timeout_secs: u64,
    /// Interval on which the heartbeat/timeout supervisor sweeps the registry.
    pub client_check_interval_secs: u64,
    /// Deadline for receiving the first (HELO) frame on a new connection.
    pub helo_deadline_secs: u64,
}

impl Default for ProtocolServerConfig {
    fn default() -> Self {
        Self {
            bind_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            bind_port: SLIMPROTO_PORT,
            streaming_port: DEFAULT_STREAMING_PORT,
            advertise_ip: None,
            client_timeout_secs: CLIENT_TIMEOUT_SECS,
            client_check_interval_secs: CLIENT_CHECK_INTERVAL_SECS,
            helo_deadline_secs: HELO_DEADLINE_SECS,
        }
    }
}

/// The slimproto TCP protocol server.
pub struct ProtocolServer {
    config: ProtocolServerConfig,
    registry: Arc<PlayerRegistry>,
    emitter: Arc<dyn EventEmitter>,
    spawner: Arc<dyn TaskSpawner>,
    streaming: Option<Arc<dyn StreamGenerationSource>>,
    cancel_token: CancellationToken,
}

impl ProtocolServer {
    /// Creates a new protocol server. Call [`ProtocolServer::run`] to start
    /// accepting connections.
    #[must_use]
    pub fn new(
        config: ProtocolServerConfig,
        registry: Arc<PlayerRegistry>,
        emitter: Arc<dyn EventEmitter>,
        spawner: Arc<dyn TaskSpawner>,
        streaming: Option<Arc<dyn StreamGenerationSource>>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            registry,
            emitter,
            spawner,
            streaming,
            cancel_token,
        }
    }

    /// Returns the shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<PlayerRegistry> {
        &self.registry
    }

    /// Binds the listener and spawns the heartbeat supervisor, then accepts
    /// connections until cancelled. One session task is spawned per accepted
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn run(self: Arc<Self>) -> SlimprotoResult<()> {
        let listener = TcpListener::bind((self.config.bind_host, self.config.bind_port))
            .await
            .map_err(FrameError::Io)?;

        log::info!(
            "slimproto listening on {}:{}",
            self.config.bind_host,
            self.config.bind_port
        );

        let supervisor = Arc::clone(&self);
        self.spawner.spawn(async move {
            supervisor.heartbeat_supervisor().await;
        });

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    log::info!("slimproto accept loop shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(&self);
                            self.spawner.spawn(async move {
                                server.handle_connection(stream, peer_addr).await;
                            });
                        }
                        Err(e) => {
                            log::warn!("accept failed: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Cancels the accept loop and heartbeat supervisor and disconnects
    /// every active session.
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();
        self.registry.disconnect_all().await;
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream, peer_addr: SocketAddr) {
        let _ = stream.set_nodelay(true);
        let (mut reader, writer) = stream.into_split();

        let helo_deadline = Duration::from_secs(self.config.helo_deadline_secs);
        let first_frame = match timeout(helo_deadline, read_client_frame(&mut reader)).await {
            Ok(Ok(frame)) => frame,
            Ok(Err(e)) => {
                log::warn!("{peer_addr}: framing error awaiting HELO: {e}");
                return;
            }
            Err(_) => {
                log::warn!("{peer_addr}: HELO deadline expired");
                return;
            }
        };

        if &first_frame.tag != b"HELO" {
            log::warn!(
                "{peer_addr}: {}",
                HandshakeError::NotHelo(first_frame.tag_str())
            );
            return;
        }

        let helo = match parse_helo(&first_frame.payload) {
            Ok(helo) => helo,
            Err(e) => {
                log::warn!("{peer_addr}: {e}");
                return;
            }
        };

        let advertise_ipv4 = self.resolve_advertise_ip(peer_addr.ip()).await;
        let advertise_ip = ipv4_to_be_u32(advertise_ipv4);
        let info = PlayerInfo::from_helo(helo, &peer_addr.ip().to_string());
        let player_id = info.mac.clone();
        let name = info.display_name.clone();
        let model = info.model_name.clone();

        let session = Arc::new(PlayerSession::new(
            info,
            Box::new(writer),
            peer_addr.ip(),
            advertise_ip,
            self.config.streaming_port,
        ));

        self.registry.register(Arc::clone(&session)).await;
        self.emitter.emit(BroadcastEvent::PlayerConnected {
            player_id: player_id.clone(),
            name,
            model,
        });

        if let Err(e) = self.send_greeting(&session).await {
            log::warn!("{peer_addr}: failed to send post-HELO greeting: {e}");
        }

        self.message_loop(&mut reader, &session).await;

        session.disconnect().await;
        self.registry.unregister(&player_id);
        self.emitter
            .emit(BroadcastEvent::PlayerDisconnected { player_id });
    }

    async fn send_greeting(&self, session: &PlayerSession) -> SlimprotoResult<()> {
        session
            .send_raw(b"vers", SERVER_VERSION_STRING.as_bytes())
            .await?;

        let mut setd_payload = vec![0u8];
        setd_payload.extend_from_slice(session.mac().as_bytes());
        session.send_raw(b"setd", &setd_payload).await?;

        session.send_heartbeat().await
    }

    async fn message_loop(
        &self,
        reader: &mut tokio::net::tcp::OwnedReadHalf,
        session: &Arc<PlayerSession>,
    ) {
        loop {
            let frame = match read_client_frame(reader).await {
                Ok(frame) => frame,
                Err(e) => {
                    match e.severity() {
                        crate::error::Severity::Warn => log::warn!("{}: {e}", session.mac()),
                        _ => log::info!("{}: connection ended: {e}", session.mac()),
                    }
                    return;
                }
            };

            session.touch();
            self.dispatch(&frame.tag, &frame.payload, session);

            if &frame.tag == b"BYE!" {
                return;
            }
        }
    }

    fn dispatch(&self, tag: &[u8; 4], payload: &[u8], session: &Arc<PlayerSession>) {
        match tag {
            b"STAT" => self.handle_stat(payload, session),
            b"BYE!" => log::debug!("{}: BYE!", session.mac()),
            b"IR  " | b"RESP" | b"META" | b"DSCO" | b"BUTN" | b"KNOB" | b"SETD" | b"ANIC" => {
                log::debug!(
                    "{}: unhandled tag {:?} ({} bytes)",
                    session.mac(),
                    std::str::from_utf8(tag).unwrap_or("?"),
                    payload.len()
                );
            }
            other => {
                log::debug!(
                    "{}: unknown tag {:?}, ignoring",
                    session.mac(),
                    std::str::from_utf8(other).unwrap_or("?")
                );
            }
        }
    }

    fn handle_stat(&self, payload: &[u8], session: &Arc<PlayerSession>) {
        let stat = parse_stat(payload);
        let effect = session.apply_stat(&stat);
        let status = session.status();

        match effect {
            StatEffect::StatusChanged => {
                self.emitter.emit(BroadcastEvent::PlayerStatus {
                    player_id: session.mac().to_string(),
                    state: status.state,
                    volume: status.volume,
                    muted: status.muted,
                    elapsed_seconds: status.elapsed_seconds,
                    elapsed_milliseconds: status.elapsed_milliseconds,
                });
            }
            StatEffect::TrackFinished => {
                let generation = self
                    .streaming
                    .as_ref()
                    .and_then(|s| s.generation_of(session.mac()));
                self.emitter.emit(BroadcastEvent::PlayerTrackFinished {
                    player_id: session.mac().to_string(),
                    stream_generation: generation,
                });
            }
            StatEffect::None => {}
        }
    }

    async fn heartbeat_supervisor(&self) {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(self.config.client_check_interval_secs));
        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => return,
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
            }
        }
    }

    async fn sweep_once(&self) {
        let now = crate::utils::now_millis();
        let timeout_ms = self.config.client_timeout_secs * 1000;
        for session in self.registry.get_all() {
            if session.millis_since_seen(now) > timeout_ms {
                let mac = session.mac().to_string();
                self.registry.unregister(&mac);
                session.disconnect().await;
                self.emitter
                    .emit(BroadcastEvent::PlayerDisconnected { player_id: mac });
            } else if let Err(e) = session.send_heartbeat().await {
                log::info!("{}: heartbeat send failed: {e}", session.mac());
            }
        }
    }

    async fn resolve_advertise_ip(&self, peer_ip: IpAddr) -> Ipv4Addr {
        if let Some(IpAddr::V4(v4)) = self.config.advertise_ip {
            if !v4.is_unspecified() {
                return v4;
            }
        }

        if let IpAddr::V4(v4) = self.config.bind_host {
            if !v4.is_unspecified() {
                return v4;
            }
        }

        if peer_ip.is_loopback() {
            return Ipv4Addr::LOCALHOST;
        }

        match udp_connect_trick(peer_ip).await {
            Ok(ip) => ip,
            Err(e) => {
                log::debug!("advertise-ip UDP connect trick failed: {e}, falling back to loopback");
                Ipv4Addr::LOCALHOST
            }
        }
    }
}

/// Opens an unconnected UDP socket, "connects" it to `(peer_ip, 9)` (no
/// packets are sent), and reads the local bound address. This is the
/// standard trick for learning which local interface the OS would use to
/// reach a given peer, without actually transmitting anything.
async fn udp_connect_trick(peer_ip: IpAddr) -> std::io::Result<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect((peer_ip, 9)).await?;
    match socket.local_addr()?.ip() {
        IpAddr::V4(v4) => Ok(v4),
        IpAddr::V6(_) => Ok(Ipv4Addr::LOCALHOST),
    }
}

fn ipv4_to_be_u32(ip: Ipv4Addr) -> u32 {
    u32::from_be_bytes(ip.octets())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_round_trips_through_be_u32() {
        let ip = Ipv4Addr::new(192, 168, 1, 1);
        let encoded = ipv4_to_be_u32(ip);
        let decoded = Ipv4Addr::from(encoded.to_be_bytes());
        assert_eq!(ip, decoded);
    }
}
