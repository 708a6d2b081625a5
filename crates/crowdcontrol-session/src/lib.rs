//! Game lifecycle tracking for the Crowd Control bridge.
//!
//! The game reports what it is doing by writing single status bytes to the
//! device. This crate turns those bytes into [`Command`]s and keeps the
//! [`SessionState`] they drive:
//!
//! 1. **Connection**: whether the link to the controller is up
//! 2. **Match**: whether the game is inside a match, the only time
//!    effects may be granted
//! 3. **Pending request**: which controller request the next result byte
//!    acknowledges
//!
//! # How it fits in the stack
//!
//! ```text
//! Device (above)  ← dispatches commands, asks whether effects are grantable
//!     ↕
//! Session Layer (this crate)  ← connection and match state
//!     ↕
//! Protocol Layer (below)  ← provides EffectStatus
//! ```

mod command;
mod error;
mod session;

pub use command::Command;
pub use error::SessionError;
pub use session::{SessionPhase, SessionState};
