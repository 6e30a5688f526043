use tokio::sync::{Mutex, MutexGuard};

use crate::registry::Outbox;

/// Append-only log of formatted chat lines, replayed to newcomers.
#[derive(Debug, Default)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

/// Exclusive access to the log. No append can happen while it is alive.
pub struct HistoryGuard<'a> {
    entries: MutexGuard<'a, Vec<String>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, message: String) {
        self.lock().await.append(message);
    }

    /// Queue every stored line, oldest first, for one session.
    pub async fn replay(&self, outbox: &Outbox) -> usize {
        self.lock().await.replay(outbox)
    }

    pub async fn lock(&self) -> HistoryGuard<'_> {
        HistoryGuard {
            entries: self.entries.lock().await,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl HistoryGuard<'_> {
    pub fn append(&mut self, message: String) {
        self.entries.push(message);
    }

    pub fn replay(&self, outbox: &Outbox) -> usize {
        let mut sent = 0;
        for entry in self.entries.iter() {
            if outbox.send(format!("{entry}\n")).is_err() {
                break;
            }
            sent += 1;
        }
        sent
    }
}
