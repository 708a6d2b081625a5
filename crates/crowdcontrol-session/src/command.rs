//! Status bytes the game writes to the device.

use std::fmt;

use crowdcontrol_protocol::EffectStatus;

use crate::SessionError;

/// One command from the game, decoded from the first byte of a DMA write.
///
/// The discriminants are the byte values the game writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// The game wrote a zero byte. Logged and otherwise ignored.
    Unknown = 0,
    /// The game booted: connect to the controller.
    GameStarted = 1,
    /// The game is shutting down: drop the connection.
    GameEnded = 2,
    /// A match began; effects may now be granted.
    MatchStarted = 3,
    /// The match is over; effects are refused until the next one.
    MatchEnded = 4,
    /// The last effect was applied.
    EffectSuccess = 5,
    /// The last effect could not be applied.
    EffectFailure = 6,
    /// The last effect isn't available right now.
    EffectUnavailable = 7,
    /// The controller should retry the last effect.
    EffectRetry = 8,
}

impl Command {
    /// Returns the byte value of this command.
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// For result commands, the status to acknowledge the pending request
    /// with. `None` for lifecycle commands.
    pub fn result_status(self) -> Option<EffectStatus> {
        match self {
            Self::EffectSuccess => Some(EffectStatus::Success),
            Self::EffectFailure => Some(EffectStatus::Failure),
            Self::EffectUnavailable => Some(EffectStatus::Unavailable),
            Self::EffectRetry => Some(EffectStatus::Retry),
            Self::Unknown
            | Self::GameStarted
            | Self::GameEnded
            | Self::MatchStarted
            | Self::MatchEnded => None,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = SessionError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        let command = match byte {
            0 => Self::Unknown,
            1 => Self::GameStarted,
            2 => Self::GameEnded,
            3 => Self::MatchStarted,
            4 => Self::MatchEnded,
            5 => Self::EffectSuccess,
            6 => Self::EffectFailure,
            7 => Self::EffectUnavailable,
            8 => Self::EffectRetry,
            other => return Err(SessionError::UnknownCommand(other)),
        };
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "STATUS_UNKNOWN",
            Self::GameStarted => "STATUS_GAME_STARTED",
            Self::GameEnded => "STATUS_GAME_ENDED",
            Self::MatchStarted => "STATUS_MATCH_STARTED",
            Self::MatchEnded => "STATUS_MATCH_ENDED",
            Self::EffectSuccess => "EFFECT_RESULT_SUCCESS",
            Self::EffectFailure => "EFFECT_RESULT_FAILURE",
            Self::EffectUnavailable => "EFFECT_RESULT_UNAVAILABLE",
            Self::EffectRetry => "EFFECT_RESULT_RETRY",
        };
        f.write_str(name)
    }
}
