//! Process-wide index of active player sessions.
//!
//! The registry is the only shared mutable structure in the protocol
//! server. [`DashMap`] gives per-key concurrent access for the lookup and
//! replace paths without a single coarse-grained lock; `register`'s
//! old-session replacement is atomic with respect to `DashMap::insert`, so
//! no concurrent `get_by_mac` can observe a handle that is about to be
//! replaced.

use std::net::IpAddr;
use std::sync::Arc;

use dashmap::DashMap;

use crate::player::PlayerSession;

/// Process-wide registry of active player sessions, keyed by MAC address.
#[derive(Default)]
pub struct PlayerRegistry {
    sessions: DashMap<String, Arc<PlayerSession>>,
}

impl PlayerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `session`. If a session already exists with the same MAC,
    /// the old one is disconnected and replaced.
    pub async fn register(&self, session: Arc<PlayerSession>) {
        let mac = session.mac().to_string();
        let previous = self.sessions.insert(mac, session);
        if let Some(previous) = previous {
            previous.disconnect().await;
        }
    }

    /// Removes and returns the session registered under `mac`, if any.
    pub fn unregister(&self, mac: &str) -> Option<Arc<PlayerSession>> {
        self.sessions.remove(mac).map(|(_, session)| session)
    }

    /// Looks up a session by MAC address.
    #[must_use]
    pub fn get_by_mac(&self, mac: &str) -> Option<Arc<PlayerSession>> {
        self.sessions.get(mac).map(|entry| Arc::clone(entry.value()))
    }

    /// Looks up the first session whose peer address matches `ip`.
    #[must_use]
    pub fn get_by_ip(&self, ip: IpAddr) -> Option<Arc<PlayerSession>> {
        self.sessions
            .iter()
            .find(|entry| entry.value().peer_ip() == ip)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Looks up the first session whose display name matches `name`,
    /// case-insensitively.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Arc<PlayerSession>> {
        self.sessions
            .iter()
            .find(|entry| entry.value().info.display_name.eq_ignore_ascii_case(name))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Returns a snapshot of every registered session.
    #[must_use]
    pub fn get_all(&self) -> Vec<Arc<PlayerSession>> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Number of currently registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshots every session, clears the registry, then disconnects each
    /// session outside the critical section.
    pub async fn disconnect_all(&self) {
        let snapshot = self.get_all();
        self.sessions.clear();
        for session in snapshot {
            session.disconnect().await;
        }
    }
}
