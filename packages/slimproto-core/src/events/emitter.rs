//! Event emitter abstraction for decoupling the protocol server from transport.
//!
//! The protocol server depends on the [`EventEmitter`] trait rather than a
//! concrete event bus, so it can be tested in isolation and embedded behind
//! whatever fan-out transport the caller uses.

use super::BroadcastEvent;

/// Trait for publishing domain events without knowledge of transport.
///
/// # Example
///
/// ```ignore
/// struct ProtocolServer {
///     emitter: Arc<dyn EventEmitter>,
/// }
///
/// impl ProtocolServer {
///     fn on_helo(&self, player_id: String, name: String, model: String) {
///         self.emitter.emit(BroadcastEvent::PlayerConnected { player_id, name, model });
///     }
/// }
/// ```
pub trait EventEmitter: Send + Sync {
    /// Publishes an event.
    fn emit(&self, event: BroadcastEvent);
}

/// No-op emitter for embedders with no event bus, or for tests that do not
/// care about published events.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit(&self, _event: BroadcastEvent) {}
}

/// Logging emitter for debugging and development.
///
/// Logs every event at debug level; does not deliver it anywhere.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit(&self, event: BroadcastEvent) {
        tracing::debug!(?event, "player_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerState;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Test emitter that counts events.
    struct CountingEventEmitter {
        count: AtomicUsize,
    }

    impl CountingEventEmitter {
        fn new() -> Self {
            Self {
                count: AtomicUsize::new(0),
            }
        }
    }

    impl EventEmitter for CountingEventEmitter {
        fn emit(&self, _event: BroadcastEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn counting_emitter_tracks_events() {
        let emitter = Arc::new(CountingEventEmitter::new());

        emitter.emit(BroadcastEvent::PlayerConnected {
            player_id: "aa:bb:cc:dd:ee:ff".to_string(),
            name: "Kitchen".to_string(),
            model: "squeezebox".to_string(),
        });
        emitter.emit(BroadcastEvent::PlayerStatus {
            player_id: "aa:bb:cc:dd:ee:ff".to_string(),
            state: PlayerState::Playing,
            volume: 50,
            muted: false,
            elapsed_seconds: 10,
            elapsed_milliseconds: 0,
        });

        assert_eq!(emitter.count.load(Ordering::SeqCst), 2);
    }
}
