//! End-to-end scenarios exercised over a real loopback TCP socket, playing
//! the part of a minimal slimproto client talking to a bootstrapped server.

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use slimproto_core::{
    bootstrap_server, BootstrapOptions, BroadcastEvent, EventEmitter, PlayerState,
    ProtocolServerConfig,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::sleep;

#[derive(Default)]
struct RecordingEmitter {
    events: Mutex<Vec<BroadcastEvent>>,
}

impl EventEmitter for RecordingEmitter {
    fn emit(&self, event: BroadcastEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn client_frame(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + payload.len());
    buf.extend_from_slice(tag);
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

async fn read_server_frame(stream: &mut TcpStream) -> ([u8; 4], Vec<u8>) {
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await.unwrap();
    let declared = u16::from_be_bytes(len_buf) as usize;
    let mut tag = [0u8; 4];
    stream.read_exact(&mut tag).await.unwrap();
    let mut payload = vec![0u8; declared - 4];
    stream.read_exact(&mut payload).await.unwrap();
    (tag, payload)
}

fn helo_payload(mac: [u8; 6]) -> Vec<u8> {
    let mut payload = vec![0x0C, 0x01];
    payload.extend_from_slice(&mac);
    payload.extend_from_slice(&[0u8; 2]);
    payload
}

fn stat_payload(event: &[u8; 4], buffer_fullness: u32, elapsed_seconds: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 41];
    payload[0..4].copy_from_slice(event);
    payload[11..15].copy_from_slice(&buffer_fullness.to_be_bytes());
    payload[37..41].copy_from_slice(&elapsed_seconds.to_be_bytes());
    payload
}

async fn spawn_server(bind_port: u16, emitter: Arc<RecordingEmitter>) {
    let config = ProtocolServerConfig {
        bind_host: std::net::IpAddr::V4(Ipv4Addr::LOCALHOST),
        bind_port,
        client_timeout_secs: 60,
        client_check_interval_secs: 30,
        ..ProtocolServerConfig::default()
    };
    let bootstrapped = bootstrap_server(BootstrapOptions {
        config,
        emitter: Some(emitter as Arc<dyn EventEmitter>),
        ..Default::default()
    });
    tokio::spawn(async move {
        let _ = bootstrapped.run().await;
    });
    sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn handshake_registers_player_and_sends_greeting() {
    let emitter = Arc::new(RecordingEmitter::default());
    spawn_server(17001, Arc::clone(&emitter)).await;

    let mut client = TcpStream::connect(("127.0.0.1", 17001)).await.unwrap();
    client
        .write_all(&client_frame(b"HELO", &helo_payload([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF])))
        .await
        .unwrap();

    let (tag, payload) = read_server_frame(&mut client).await;
    assert_eq!(&tag, b"vers");
    assert_eq!(payload, b"8.5.0");

    let (tag, payload) = read_server_frame(&mut client).await;
    assert_eq!(&tag, b"setd");
    assert_eq!(payload[0], 0);
    assert_eq!(&payload[1..], b"aa:bb:cc:dd:ee:ff");

    let (tag, payload) = read_server_frame(&mut client).await;
    assert_eq!(&tag, b"strm");
    assert_eq!(payload[0], b't');

    sleep(Duration::from_millis(50)).await;
    let events = emitter.events.lock().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, BroadcastEvent::PlayerConnected { player_id, .. } if player_id == "aa:bb:cc:dd:ee:ff")));
}

#[tokio::test]
async fn playing_tick_promotes_state() {
    let emitter = Arc::new(RecordingEmitter::default());
    let config = ProtocolServerConfig {
        bind_host: std::net::IpAddr::V4(Ipv4Addr::LOCALHOST),
        bind_port: 17002,
        client_timeout_secs: 60,
        client_check_interval_secs: 30,
        ..ProtocolServerConfig::default()
    };
    let bootstrapped = bootstrap_server(BootstrapOptions {
        config,
        emitter: Some(Arc::clone(&emitter) as Arc<dyn EventEmitter>),
        ..Default::default()
    });
    let registry = bootstrapped.registry.clone();
    tokio::spawn(async move {
        let _ = bootstrapped.run().await;
    });
    sleep(Duration::from_millis(50)).await;

    let mac = [0x00, 0x04, 0x20, 0x12, 0x34, 0x56];
    let mut client = TcpStream::connect(("127.0.0.1", 17002)).await.unwrap();
    client
        .write_all(&client_frame(b"HELO", &helo_payload(mac)))
        .await
        .unwrap();
    for _ in 0..3 {
        read_server_frame(&mut client).await;
    }

    client
        .write_all(&client_frame(b"STAT", &stat_payload(b"STMt", 8192, 0)))
        .await
        .unwrap();
    sleep(Duration::from_millis(50)).await;

    let session = registry.get_by_mac("00:04:20:12:34:56").unwrap();
    assert_eq!(session.status().state, PlayerState::Playing);
}

#[tokio::test]
async fn pause_round_trip_sends_frame_and_client_stat_confirms() {
    let emitter = Arc::new(RecordingEmitter::default());
    let config = ProtocolServerConfig {
        bind_host: std::net::IpAddr::V4(Ipv4Addr::LOCALHOST),
        bind_port: 17003,
        client_timeout_secs: 60,
        client_check_interval_secs: 30,
        ..ProtocolServerConfig::default()
    };
    let bootstrapped = bootstrap_server(BootstrapOptions {
        config,
        emitter: Some(Arc::clone(&emitter) as Arc<dyn EventEmitter>),
        ..Default::default()
    });
    let registry = bootstrapped.registry.clone();
    tokio::spawn(async move {
        let _ = bootstrapped.run().await;
    });
    sleep(Duration::from_millis(50)).await;

    let mac = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
    let mut client = TcpStream::connect(("127.0.0.1", 17003)).await.unwrap();
    client
        .write_all(&client_frame(b"HELO", &helo_payload(mac)))
        .await
        .unwrap();
    for _ in 0..3 {
        read_server_frame(&mut client).await;
    }

    let session = registry.get_by_mac("11:22:33:44:55:66").unwrap();
    session.pause().await.unwrap();

    let (tag, payload) = read_server_frame(&mut client).await;
    assert_eq!(&tag, b"strm");
    assert_eq!(payload[0], b'p');
    assert_eq!(payload[1], b'0');
    assert_eq!(payload[2], b'm');
    assert_eq!(session.status().state, PlayerState::Paused);

    client
        .write_all(&client_frame(b"STAT", &stat_payload(b"STMp", 0, 0)))
        .await
        .unwrap();
    sleep(Duration::from_millis(50)).await;
    assert_eq!(session.status().state, PlayerState::Paused);

    let events = emitter.events.lock().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, BroadcastEvent::PlayerStatus { state: PlayerState::Paused, .. })));
}

#[tokio::test]
async fn spurious_stmd_at_stream_start_is_ignored() {
    let emitter = Arc::new(RecordingEmitter::default());
    let config = ProtocolServerConfig {
        bind_host: std::net::IpAddr::V4(Ipv4Addr::LOCALHOST),
        bind_port: 17004,
        client_timeout_secs: 60,
        client_check_interval_secs: 30,
        ..ProtocolServerConfig::default()
    };
    let bootstrapped = bootstrap_server(BootstrapOptions {
        config,
        emitter: Some(Arc::clone(&emitter) as Arc<dyn EventEmitter>),
        ..Default::default()
    });
    tokio::spawn(async move {
        let _ = bootstrapped.run().await;
    });
    sleep(Duration::from_millis(50)).await;

    let mac = [0x99, 0x88, 0x77, 0x66, 0x55, 0x44];
    let mut client = TcpStream::connect(("127.0.0.1", 17004)).await.unwrap();
    client
        .write_all(&client_frame(b"HELO", &helo_payload(mac)))
        .await
        .unwrap();
    for _ in 0..3 {
        read_server_frame(&mut client).await;
    }

    client
        .write_all(&client_frame(b"STAT", &stat_payload(b"STMd", 0, 0)))
        .await
        .unwrap();
    sleep(Duration::from_millis(50)).await;

    let events = emitter.events.lock().unwrap();
    assert!(!events
        .iter()
        .any(|e| matches!(e, BroadcastEvent::PlayerTrackFinished { .. })));
}

#[tokio::test(start_paused = true)]
async fn heartbeat_timeout_evicts_idle_session() {
    let emitter = Arc::new(RecordingEmitter::default());
    let config = ProtocolServerConfig {
        bind_host: std::net::IpAddr::V4(Ipv4Addr::LOCALHOST),
        bind_port: 17005,
        client_timeout_secs: 1,
        client_check_interval_secs: 1,
        ..ProtocolServerConfig::default()
    };
    let bootstrapped = bootstrap_server(BootstrapOptions {
        config,
        emitter: Some(Arc::clone(&emitter) as Arc<dyn EventEmitter>),
        ..Default::default()
    });
    let registry = bootstrapped.registry.clone();
    tokio::spawn(async move {
        let _ = bootstrapped.run().await;
    });
    sleep(Duration::from_millis(50)).await;

    let mac = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
    let mut client = TcpStream::connect(("127.0.0.1", 17005)).await.unwrap();
    client
        .write_all(&client_frame(b"HELO", &helo_payload(mac)))
        .await
        .unwrap();
    for _ in 0..3 {
        read_server_frame(&mut client).await;
    }

    assert!(registry.get_by_mac("01:02:03:04:05:06").is_some());

    sleep(Duration::from_millis(2500)).await;

    assert!(registry.get_by_mac("01:02:03:04:05:06").is_none());
    let events = emitter.events.lock().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, BroadcastEvent::PlayerDisconnected { player_id } if player_id == "01:02:03:04:05:06")));
}
