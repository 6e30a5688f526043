use thiserror::Error;

/// Errors caused by client input. They are reported privately to the
/// offending client and never end the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Name change failed. New name cannot be empty.")]
    EmptyName,
}
