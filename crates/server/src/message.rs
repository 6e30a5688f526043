use chrono::{Local, NaiveDateTime};
use core::fmt;

/// Prompt written once, right after the banner. No line terminator.
pub const NAME_PROMPT: &str = "ENTER YOUR NAME: ";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Server-generated text lines. The rendered strings are the wire format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Joined { name: String },
    Left { name: String },
    Renamed { old: String, new: String },
    RenameConfirmed { name: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Joined { name } => write!(f, "{name} has joined the chat"),
            Notice::Left { name } => write!(f, "{name} has left the chat"),
            Notice::Renamed { old, new } => write!(f, "{old} has changed their name to {new}"),
            Notice::RenameConfirmed { name } => write!(f, "Your name has been changed to {name}"),
        }
    }
}

/// A chat message as stored in history and broadcast to peers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatLine {
    pub sent_at: NaiveDateTime,
    pub from: String,
    pub body: String,
}

impl ChatLine {
    /// Stamp a message with the local wall-clock time.
    pub fn now(from: &str, body: &str) -> Self {
        Self::at(Local::now().naive_local(), from, body)
    }

    pub fn at(sent_at: NaiveDateTime, from: &str, body: &str) -> Self {
        Self {
            sent_at,
            from: from.to_owned(),
            body: body.to_owned(),
        }
    }
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}][{}]: {}",
            self.sent_at.format(TIMESTAMP_FORMAT),
            self.from,
            self.body
        )
    }
}
