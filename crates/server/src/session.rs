//! One accepted connection, from banner to goodbye.
//!
//! ```text
//! Connecting -> AwaitingName -> Active -> Closed
//!                    |                      ^
//!                    +----- EOF / error ----+
//! ```
//!
//! All bytes for the client go through the session's outbox and are written
//! by a dedicated writer task, so private replies, history replay and
//! broadcasts from other sessions never interleave mid-line.

use std::sync::Arc;

use tokio::{
    io::{
        AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
        BufReader,
    },
    sync::mpsc,
};
use tracing::{debug, warn};

use crate::command::{Command, strip_terminator};
use crate::error::ProtocolError;
use crate::message::{NAME_PROMPT, Notice};
use crate::registry::{Outbox, SessionId};
use crate::room::Room;

/// Longest accepted client line in bytes, terminator included. A longer line
/// ends the session.
pub const MAX_LINE: usize = 64 * 1024;

/// A session that has chosen a name and is registered in the room.
pub struct Session {
    id: SessionId,
    name: String,
    room: Arc<Room>,
    outbox: Outbox,
}

impl Session {
    /// Register under `name`. Announces the join and replays history.
    pub async fn join(id: SessionId, name: String, room: Arc<Room>, outbox: Outbox) -> Self {
        room.register(id, &name, outbox.clone()).await;
        Self {
            id,
            name,
            room,
            outbox,
        }
    }

    /// Act on one line from the client, terminator already stripped.
    pub async fn handle_line(&mut self, line: &str) {
        match Command::parse(line) {
            Command::Empty => {}
            Command::Rename("") => self.send_line(&ProtocolError::EmptyName.to_string()),
            Command::Rename(new_name) => {
                if self.room.rename(self.id, new_name).await.is_some() {
                    self.name = new_name.to_owned();
                    let confirmation = Notice::RenameConfirmed {
                        name: self.name.clone(),
                    };
                    self.send_line(&confirmation.to_string());
                }
            }
            Command::Chat(body) => {
                self.room.post(self.id, &self.name, body).await;
            }
        }
    }

    /// Unregister and announce the departure. Consumes the session so it
    /// can only happen once.
    pub async fn leave(self) {
        self.room.unregister(self.id).await;
    }

    fn send_line(&self, text: &str) {
        let _ = self.outbox.send(format!("{text}\n"));
    }
}

/// Drive one connection through the whole protocol. Returns once the client
/// is gone and everything queued for it has been written.
pub async fn handle_client<S>(stream: S, room: Arc<Room>, banner: String)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let id = room.next_session_id();
    let (reader_half, writer_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader_half);

    let (outbox, outgoing) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_outgoing(writer_half, outgoing, id));

    if !banner.is_empty() {
        let _ = outbox.send(banner);
    }
    let _ = outbox.send(NAME_PROMPT.to_owned());

    let mut buf = Vec::new();
    if let Some(name) = read_line(&mut reader, &mut buf, id).await {
        let mut session = Session::join(id, name, room, outbox.clone()).await;

        while let Some(input) = read_line(&mut reader, &mut buf, id).await {
            session.handle_line(&input).await;
        }

        session.leave().await;
    }

    drop(outbox);
    let _ = writer.await;
}

/// Next line without its terminator, or `None` once the client is gone or
/// sends a line longer than [`MAX_LINE`]. Invalid UTF-8 is replaced, not
/// rejected.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>, id: SessionId) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    match (&mut *reader)
        .take(MAX_LINE as u64)
        .read_until(b'\n', buf)
        .await
    {
        Ok(0) => None,
        Ok(n) if n == MAX_LINE && !buf.ends_with(b"\n") => {
            warn!(session = %id, "line exceeds {MAX_LINE} bytes");
            None
        }
        Ok(_) => Some(strip_terminator(&String::from_utf8_lossy(buf)).to_owned()),
        Err(e) => {
            warn!(session = %id, "error reading from client: {e}");
            None
        }
    }
}

async fn write_outgoing<W>(mut w: W, mut outgoing: mpsc::UnboundedReceiver<String>, id: SessionId)
where
    W: AsyncWrite + Unpin,
{
    while let Some(chunk) = outgoing.recv().await {
        if let Err(e) = w.write_all(chunk.as_bytes()).await {
            debug!(session = %id, "write failed: {e}");
        }
    }
    let _ = w.shutdown().await;
}
