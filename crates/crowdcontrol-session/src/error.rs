//! Error types for the session layer.
//!
//! The session itself can't fail: every state transition is defined for
//! every state. The only error is a status byte that isn't a command.

/// Errors that can occur while interpreting game status bytes.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    /// The game wrote a status byte outside the command table.
    /// The device hands these to the host's default write handling.
    #[error("unrecognized command byte {0:#04x}")]
    UnknownCommand(u8),
}
