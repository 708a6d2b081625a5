//! Session types: what the device knows about the game and the controller.
//!
//! A "session" spans from the game starting to the game ending. It tracks:
//! - WHETHER the link to the controller is up
//! - WHETHER the game is in a match
//! - WHICH controller request the game will answer next

use std::fmt;

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Summary of a [`SessionState`] for logging and tests.
///
/// ```text
///                  GameStarted / MatchStarted (connect ok)
///   Disconnected ─────────────────────────────→ Connected·OutOfMatch
///        ↑                                           │      ↑
///        │ GameEnded                    MatchStarted │      │ MatchEnded
///        │                                           ▼      │
///        └────────────────────────────────────── Connected·InMatch
/// ```
///
/// Connection and match membership are tracked separately, so a session
/// can be in a match without a link (the connect on `MatchStarted`
/// failed). That still reports `Disconnected`: with no link there is
/// nothing to grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    OutOfMatch,
    InMatch,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::OutOfMatch => write!(f, "Connected·OutOfMatch"),
            Self::InMatch => write!(f, "Connected·InMatch"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Process-lifetime state of one device.
///
/// There is no terminal state: `Disconnected` is both where a session
/// starts and where `GameEnded` brings it back to.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    connected: bool,
    in_match: bool,
    pending_request: Option<i64>,
}

impl SessionState {
    /// Creates a disconnected, out-of-match session with no pending request.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while the link to the controller is believed to be up.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// `true` while the game is in a match.
    pub fn in_match(&self) -> bool {
        self.in_match
    }

    /// The controller request the next result byte acknowledges, if any.
    pub fn pending_request(&self) -> Option<i64> {
        self.pending_request
    }

    /// Collapses the flags into a single phase, for logs and assertions.
    ///
    /// Being in a match while disconnected reads as `Disconnected`: nothing
    /// can be granted without a controller either way.
    pub fn phase(&self) -> SessionPhase {
        match (self.connected, self.in_match) {
            (false, _) => SessionPhase::Disconnected,
            (true, false) => SessionPhase::OutOfMatch,
            (true, true) => SessionPhase::InMatch,
        }
    }

    /// Records the outcome of a connect attempt.
    pub fn record_connect(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Marks the link as gone. Match membership is left alone.
    pub fn mark_disconnected(&mut self) {
        self.connected = false;
    }

    /// Enters a match, whether or not the link is up.
    pub fn start_match(&mut self) {
        self.in_match = true;
    }

    /// Leaves the match. Returns `false` if there was no match to leave.
    pub fn end_match(&mut self) -> bool {
        std::mem::replace(&mut self.in_match, false)
    }

    /// Effects are granted only inside a match.
    pub fn can_grant(&self) -> bool {
        self.in_match
    }

    /// Remembers `id` as the request to acknowledge next, replacing any
    /// earlier one.
    pub fn remember_request(&mut self, id: i64) {
        if let Some(previous) = self.pending_request.replace(id) {
            if previous != id {
                tracing::debug!(previous, id, "pending request superseded");
            }
        }
    }

    /// Takes the pending request id. Each request is acknowledged once.
    pub fn take_pending_request(&mut self) -> Option<i64> {
        self.pending_request.take()
    }
}
