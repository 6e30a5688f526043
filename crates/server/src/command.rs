/// Prefix of the rename command, trailing space included.
pub const RENAME_PREFIX: &str = "/name ";

/// What a single client line asks the server to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// Blank line, dropped without a trace.
    Empty,
    /// `/name <new>`; the new name may be empty, which the session rejects.
    Rename(&'a str),
    Chat(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        if line.is_empty() {
            return Command::Empty;
        }

        match line.strip_prefix(RENAME_PREFIX) {
            Some(new_name) => Command::Rename(new_name),
            None => Command::Chat(line),
        }
    }
}

/// Strip the line terminator (`\n` or `\r\n`) and nothing else.
pub fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
