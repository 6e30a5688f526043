use core::fmt;
use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};

/// Send side of a session's outgoing byte queue. Whatever is pushed here is
/// written verbatim, in order, to that session's connection.
pub type Outbox = mpsc::UnboundedSender<String>;

/// Identity of one accepted connection, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered session as seen by everybody else.
#[derive(Debug, Clone)]
pub struct Peer {
    pub name: String,
    pub outbox: Outbox,
}

/// The set of active sessions. Every insert, remove, rename and full
/// iteration holds the same lock for its whole duration.
#[derive(Debug, Default)]
pub struct Registry {
    peers: Mutex<HashMap<SessionId, Peer>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, id: SessionId, peer: Peer) {
        self.peers.lock().await.insert(id, peer);
    }

    /// Remove a session, returning it if it was present.
    pub async fn remove(&self, id: SessionId) -> Option<Peer> {
        self.peers.lock().await.remove(&id)
    }

    /// Replace a session's display name, returning the previous one.
    pub async fn rename(&self, id: SessionId, new_name: &str) -> Option<String> {
        let mut peers = self.peers.lock().await;
        let peer = peers.get_mut(&id)?;
        Some(std::mem::replace(&mut peer.name, new_name.to_owned()))
    }

    /// Run `f` on every session except `exclude` while holding the lock, so
    /// no insert, remove or rename can interleave with the iteration.
    pub async fn for_each_excluding<F>(&self, exclude: Option<SessionId>, mut f: F)
    where
        F: FnMut(SessionId, &Peer),
    {
        let peers = self.peers.lock().await;
        for (id, peer) in peers.iter() {
            if Some(*id) != exclude {
                f(*id, peer);
            }
        }
    }

    /// Every session except `sender`, copied out under the lock.
    pub async fn snapshot_excluding(&self, sender: Option<SessionId>) -> Vec<(SessionId, Peer)> {
        let mut snapshot = Vec::new();
        self.for_each_excluding(sender, |id, peer| snapshot.push((id, peer.clone())))
            .await;
        snapshot
    }

    pub async fn len(&self) -> usize {
        self.peers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.peers.lock().await.is_empty()
    }
}
