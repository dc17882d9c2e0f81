//! slimproto-core - shared library for the slimproto server.
//!
//! This crate provides the core functionality for a standalone Slimproto
//! server: the TCP protocol endpoint that Squeezebox-family players (and
//! software players such as SqueezePlay and Squeezelite) connect to for
//! transport control and playback status. It is designed to be used by a
//! standalone headless server binary, and by any embedder wanting to drive
//! the same player fleet from its own process.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`runtime`]: Task spawning abstraction for async runtime independence
//! - [`lifecycle`]: Application restart/shutdown abstraction
//! - [`events`]: Event system for publishing protocol-meaningful transitions
//! - [`protocol`]: Wire framing, command builders, and HELO/STAT parsing
//! - [`player`]: Player identity, dynamic status, and per-connection session
//! - [`registry`]: Process-wide index of active player sessions
//! - [`server`]: The TCP listener, accept loop, and heartbeat supervisor
//! - [`streaming_policy`]: Format resolution and the stream-generation seam
//! - [`bootstrap`]: Composition root wiring the above together
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! The crate defines several traits to decouple core logic from
//! platform-specific implementations:
//!
//! - [`TaskSpawner`](runtime::TaskSpawner): Spawning background tasks
//! - [`EventEmitter`](events::EventEmitter): Publishing domain events
//! - [`Lifecycle`](lifecycle::Lifecycle): Application restart/shutdown
//! - [`StreamGenerationSource`](streaming_policy::StreamGenerationSource):
//!   Reading stream generations from an external streaming collaborator
//!
//! Each trait has a no-op or logging default implementation suitable for a
//! server with no embedder.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod player;
pub mod protocol;
pub mod protocol_constants;
pub mod registry;
pub mod runtime;
pub mod server;
pub mod streaming_policy;
pub mod utils;

pub use bootstrap::{bootstrap_server, BootstrapOptions, BootstrappedServer};
pub use error::{
    ArgumentError, ErrorCode, FrameError, HandshakeError, Severity, SlimprotoError,
    SlimprotoResult,
};
pub use events::{BroadcastEvent, EventEmitter, LoggingEventEmitter, NoopEventEmitter};
pub use lifecycle::{Lifecycle, NoopLifecycle, ServerLifecycle};
pub use player::{PlayerInfo, PlayerSession, PlayerState, PlayerStatus, StatEffect};
pub use protocol::{
    build_audg_frame, build_strm_flush, build_strm_pause, build_strm_start, build_strm_status,
    build_strm_stop, build_strm_unpause, parse_helo, parse_stat, read_client_frame,
    write_server_frame, AudioFormat, ClientFrame, DeviceClass, HeloInfo, StatFrame,
    StreamCommand,
};
pub use registry::PlayerRegistry;
pub use runtime::{TaskSpawner, TokioSpawner};
pub use server::{ProtocolServer, ProtocolServerConfig};
pub use streaming_policy::{resolve_format, ResolvedFormat, StreamGenerationSource};
pub use utils::now_millis;
