use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::broadcast::broadcast;
use crate::history::History;
use crate::message::{ChatLine, Notice};
use crate::registry::{Outbox, Peer, Registry, SessionId};

/// All state shared between sessions: who is online and what has been said.
///
/// Lock order is history before registry. [`Room::register`] and [`Room::post`]
/// hold both; every other path takes one lock at a time.
#[derive(Debug, Default)]
pub struct Room {
    registry: Registry,
    history: History,
    next_id: AtomicU64,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_session_id(&self) -> SessionId {
        SessionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub async fn online(&self) -> usize {
        self.registry.len().await
    }

    /// Add a session, replay history to it, then announce it to the others.
    ///
    /// The replay is queued while history is still locked and the session is
    /// already registered, so every chat line reaches the newcomer exactly
    /// once: in the replay if it was appended first, by broadcast otherwise.
    pub async fn register(&self, id: SessionId, name: &str, outbox: Outbox) {
        let history = self.history.lock().await;
        self.registry
            .insert(
                id,
                Peer {
                    name: name.to_owned(),
                    outbox: outbox.clone(),
                },
            )
            .await;
        let replayed = history.replay(&outbox);
        drop(history);

        info!(session = %id, name, replayed, "joined");
        let notice = Notice::Joined {
            name: name.to_owned(),
        };
        broadcast(&self.registry, &notice.to_string(), Some(id)).await;
    }

    /// Remove a session and tell everybody left. Only the call that actually
    /// removes the entry announces the departure.
    pub async fn unregister(&self, id: SessionId) -> Option<String> {
        let peer = self.registry.remove(id).await?;

        info!(session = %id, name = %peer.name, "left");
        let notice = Notice::Left {
            name: peer.name.clone(),
        };
        broadcast(&self.registry, &notice.to_string(), None).await;
        Some(peer.name)
    }

    /// Change a session's name and announce it to the others. Returns the
    /// previous name, or `None` if the session is not registered.
    pub async fn rename(&self, id: SessionId, new_name: &str) -> Option<String> {
        let old = self.registry.rename(id, new_name).await?;

        let notice = Notice::Renamed {
            old: old.clone(),
            new: new_name.to_owned(),
        };
        broadcast(&self.registry, &notice.to_string(), Some(id)).await;
        Some(old)
    }

    /// Record a chat message and send it to everybody but its author.
    ///
    /// History stays locked until the broadcast is queued so a concurrent
    /// [`Room::register`] sees the line either in its replay or live.
    pub async fn post(&self, id: SessionId, from: &str, body: &str) -> String {
        let formatted = ChatLine::now(from, body).to_string();
        let mut history = self.history.lock().await;
        history.append(formatted.clone());
        broadcast(&self.registry, &formatted, Some(id)).await;
        drop(history);
        formatted
    }
}
