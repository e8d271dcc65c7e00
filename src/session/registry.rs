//! Concurrent session storage and group-scoped delivery.
//!
//! [`SessionRegistry`] tracks every connected client and its broadcast-group
//! memberships behind a single [`tokio::sync::RwLock`]. It also holds each
//! session's outbound channel, so the relay resolves an audience and
//! delivers to it through one shared structure.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};

use super::SessionId;
use crate::error::RelayError;
use crate::relay::events::ServerEvent;

/// Per-connection state owned exclusively by the registry.
#[derive(Debug)]
struct Session {
    connected_at: DateTime<Utc>,
    groups: HashSet<String>,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

/// Immutable snapshot of a registered session, returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    /// Session identifier.
    pub id: SessionId,
    /// When the connection was registered.
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    sessions: HashMap<SessionId, Session>,
    groups: HashMap<String, HashSet<SessionId>>,
}

/// Central store for all connected sessions.
///
/// # Concurrency
///
/// - Audience resolution takes a read lock; many relays may resolve
///   concurrently.
/// - Registration and membership mutation take the write lock and are
///   serialized.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session, replacing any prior state for the same id.
    ///
    /// The previous session's group memberships, if any, are discarded: a
    /// re-registered id starts with an empty membership set.
    pub async fn register(
        &self,
        id: SessionId,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) -> SessionInfo {
        let connected_at = Utc::now();
        let mut inner = self.inner.write().await;
        remove_session(&mut inner, &id);
        inner.sessions.insert(
            id,
            Session {
                connected_at,
                groups: HashSet::new(),
                tx,
            },
        );
        SessionInfo { id, connected_at }
    }

    /// Removes a session and all of its group memberships. Idempotent.
    pub async fn unregister(&self, id: &SessionId) {
        let mut inner = self.inner.write().await;
        remove_session(&mut inner, id);
    }

    /// Adds the session to a broadcast group. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::SessionNotFound`] if the connection no longer
    /// exists; callers log this instead of raising it to the client.
    pub async fn join_group(&self, id: &SessionId, group: &str) -> Result<(), RelayError> {
        let mut inner = self.inner.write().await;
        let Some(session) = inner.sessions.get_mut(id) else {
            return Err(RelayError::SessionNotFound(*id));
        };
        session.groups.insert(group.to_string());
        inner.groups.entry(group.to_string()).or_default().insert(*id);
        Ok(())
    }

    /// Returns the current members of a broadcast group.
    pub async fn members_of(&self, group: &str) -> HashSet<SessionId> {
        let inner = self.inner.read().await;
        inner.groups.get(group).cloned().unwrap_or_default()
    }

    /// Delivers an event to one session. Fire-and-forget: a missing session
    /// or a closed channel is logged at `debug` and otherwise ignored.
    pub async fn send_to(&self, id: &SessionId, event: ServerEvent) {
        let inner = self.inner.read().await;
        let Some(session) = inner.sessions.get(id) else {
            tracing::debug!(session_id = %id, "send_to on unknown session");
            return;
        };
        if session.tx.send(event).is_err() {
            tracing::debug!(session_id = %id, "session channel closed");
        }
    }

    /// Delivers an event to every connected session, including any sender.
    ///
    /// Returns the number of sessions the event was handed to.
    pub async fn broadcast(&self, event: &ServerEvent) -> usize {
        let inner = self.inner.read().await;
        let mut delivered = 0;
        for (id, session) in &inner.sessions {
            if session.tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(session_id = %id, "session channel closed");
            }
        }
        delivered
    }

    /// Delivers an event to every member of a broadcast group.
    ///
    /// Returns the number of members the event was handed to.
    pub async fn broadcast_group(&self, group: &str, event: &ServerEvent) -> usize {
        let inner = self.inner.read().await;
        let Some(members) = inner.groups.get(group) else {
            return 0;
        };
        let mut delivered = 0;
        for id in members {
            let Some(session) = inner.sessions.get(id) else {
                continue;
            };
            if session.tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(session_id = %id, "session channel closed");
            }
        }
        delivered
    }

    /// Returns the info snapshot for a session, if it is registered.
    pub async fn get(&self, id: &SessionId) -> Option<SessionInfo> {
        let inner = self.inner.read().await;
        inner.sessions.get(id).map(|s| SessionInfo {
            id: *id,
            connected_at: s.connected_at,
        })
    }

    /// Returns the number of connected sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// Returns `true` if no sessions are connected.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.sessions.is_empty()
    }
}

/// Removes a session from the table and from every group index entry,
/// pruning groups that become empty.
fn remove_session(inner: &mut RegistryInner, id: &SessionId) {
    if let Some(session) = inner.sessions.remove(id) {
        for group in &session.groups {
            if let Some(members) = inner.groups.get_mut(group) {
                members.remove(id);
                if members.is_empty() {
                    inner.groups.remove(group);
                }
            }
        }
    }
}
