//! Application bootstrap and dependency wiring.
//!
//! This module contains the composition root - the single place where the
//! registry, event emitter, task spawner, lifecycle handle, and protocol
//! server are instantiated and wired together. This pattern provides:
//!
//! - **Clarity**: All dependency relationships are visible in one place
//! - **Testability**: Easy to swap implementations for testing
//! - **Maintainability**: Service creation logic is isolated from usage

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::SlimprotoResult;
use crate::events::{EventEmitter, NoopEventEmitter};
use crate::lifecycle::{Lifecycle, NoopLifecycle};
use crate::registry::PlayerRegistry;
use crate::runtime::{TaskSpawner, TokioSpawner};
use crate::server::{ProtocolServer, ProtocolServerConfig};
use crate::streaming_policy::StreamGenerationSource;

/// Inputs to [`bootstrap_server`]. Fields left `None` fall back to a no-op
/// collaborator, which is sufficient for a server with no embedder and no
/// streaming-generation collaborator wired in.
#[derive(Default)]
pub struct BootstrapOptions {
    /// Listener address, ports, and timeout knobs.
    pub config: ProtocolServerConfig,
    /// Where protocol-meaningful events are published. Defaults to
    /// [`NoopEventEmitter`].
    pub emitter: Option<Arc<dyn EventEmitter>>,
    /// Application-level restart/shutdown hook. Defaults to [`NoopLifecycle`].
    pub lifecycle: Option<Arc<dyn Lifecycle>>,
    /// Collaborator exposing stream generations for `PlayerTrackFinished`
    /// events. Absent by default; the out-of-scope streaming service injects
    /// one when present.
    pub streaming: Option<Arc<dyn StreamGenerationSource>>,
}

/// Container for the bootstrapped server and the collaborators wired into
/// it, so an embedder can reach the registry or lifecycle handle directly
/// without threading them through separately.
pub struct BootstrappedServer {
    server: Arc<ProtocolServer>,
    /// Shared player registry, exposed for embedders that want to query
    /// connected players directly (e.g. an HTTP control surface).
    pub registry: Arc<PlayerRegistry>,
    /// Lifecycle handle, exposed so an embedder can wire it into its own
    /// control surface (e.g. a "restart" admin command).
    pub lifecycle: Arc<dyn Lifecycle>,
    cancel_token: CancellationToken,
}

impl BootstrappedServer {
    /// Runs the protocol server until cancelled via [`BootstrappedServer::shutdown`].
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn run(&self) -> SlimprotoResult<()> {
        Arc::clone(&self.server).run().await
    }

    /// Cancels the accept loop and heartbeat supervisor and disconnects
    /// every active session.
    pub async fn shutdown(&self) {
        self.server.shutdown().await;
    }

    /// Returns the underlying cancellation token, for an embedder that wants
    /// to observe shutdown rather than only trigger it.
    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }
}

/// Bootstraps the protocol server and its collaborators.
///
/// This is the composition root where the registry, event emitter, task
/// spawner, and server are instantiated and wired together. Construction
/// never fails; binding the listener happens lazily in
/// [`BootstrappedServer::run`].
#[must_use]
pub fn bootstrap_server(options: BootstrapOptions) -> BootstrappedServer {
    let registry = Arc::new(PlayerRegistry::new());
    let emitter = options.emitter.unwrap_or_else(|| Arc::new(NoopEventEmitter));
    let lifecycle: Arc<dyn Lifecycle> = options.lifecycle.unwrap_or_else(|| Arc::new(NoopLifecycle));
    let spawner: Arc<dyn TaskSpawner> = Arc::new(TokioSpawner::current());
    let cancel_token = CancellationToken::new();

    let server = Arc::new(ProtocolServer::new(
        options.config,
        Arc::clone(&registry),
        emitter,
        spawner,
        options.streaming,
        cancel_token.clone(),
    ));

    BootstrappedServer {
        server,
        registry,
        lifecycle,
        cancel_token,
    }
}
