//! Connection registry
//!
//! Maps user ids to the connection currently serving them. Every operation
//! touches a single key, so one async mutex around the map is enough.

use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one accepted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// What the registry remembers about a live connection.
///
/// Holds no I/O capability: dropping a handle never closes anything.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    peer_addr: SocketAddr,
    connected_at: Instant,
}

impl ConnectionHandle {
    pub fn new(peer_addr: SocketAddr) -> Self {
        Self {
            id: ConnectionId::next(),
            peer_addr,
            connected_at: Instant::now(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Shared `user_id -> ConnectionHandle` map.
///
/// Cloning is cheap and every clone sees the same entries.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<Mutex<HashMap<String, ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `user_id`.
    ///
    /// Returns the displaced handle. The displaced connection is left open.
    pub async fn register(
        &self,
        user_id: &str,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        let mut connections = self.connections.lock().await;
        let new_id = handle.id;
        let previous = connections.insert(user_id.to_string(), handle);

        if let Some(old) = &previous {
            warn!(
                "User {} reconnected as {}, {} from {} is no longer registered",
                user_id, new_id, old.id, old.peer_addr
            );
        }

        previous
    }

    /// Removes the entry for `user_id`. Absent keys are a no-op.
    pub async fn unregister(&self, user_id: &str) -> Option<ConnectionHandle> {
        self.connections.lock().await.remove(user_id)
    }

    /// Removes the entry for `user_id` only if it still belongs to `id`.
    ///
    /// Returns whether an entry was removed.
    pub async fn release(&self, user_id: &str, id: ConnectionId) -> bool {
        let mut connections = self.connections.lock().await;

        match connections.get(user_id) {
            Some(current) if current.id == id => {
                connections.remove(user_id);
                true
            }
            Some(current) => {
                debug!(
                    "Not releasing {}: entry for {} now belongs to {}",
                    id, user_id, current.id
                );
                false
            }
            None => false,
        }
    }

    pub async fn lookup(&self, user_id: &str) -> Option<ConnectionHandle> {
        self.connections.lock().await.get(user_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }

    /// Snapshot of the registered user ids, sorted
    pub async fn user_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.connections.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
