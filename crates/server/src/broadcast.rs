use tracing::debug;

use crate::registry::{Registry, SessionId};

/// Queue `message` plus a line terminator for every registered session except
/// `exclude`. The registry lock is held across the whole fan-out so concurrent
/// broadcasts reach every recipient in the same order. Enqueueing never blocks.
///
/// A recipient whose connection is gone is skipped and stays registered; its
/// own session task removes it once its read side ends.
///
/// Returns the number of sessions the message was queued for.
pub async fn broadcast(registry: &Registry, message: &str, exclude: Option<SessionId>) -> usize {
    let line = format!("{message}\n");

    let mut delivered = 0;
    registry
        .for_each_excluding(exclude, |id, peer| match peer.outbox.send(line.clone()) {
            Ok(()) => delivered += 1,
            Err(_) => debug!(session = %id, "dropping broadcast for closed session"),
        })
        .await;

    delivered
}
