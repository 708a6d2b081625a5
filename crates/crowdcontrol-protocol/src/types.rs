//! Message types exchanged with the Crowd Control controller.
//!
//! Inbound, the controller sends an [`EffectRequest`]:
//!
//! ```json
//! {"id":3,"code":"give_stocks_3","parameters":["player_2",3],"targets":[],"viewer":"sdk","type":1}
//! ```
//!
//! Only `id`, `code` and `parameters` matter; the rest is ignored.
//! Outbound, the device answers with an [`Acknowledgement`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// The most parameters a request may carry. The game reads one effect slot
/// followed by this many parameter slots.
pub const MAX_PARAMETERS: usize = 4;

/// Text placed in the `message` field of acknowledgements.
pub const ACK_MESSAGE: &str = "Response sent from game";

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// An effect code or parameter as the controller writes it.
///
/// The controller is free to send either a bare number or a descriptive
/// string whose trailing `_`-separated segment is the number
/// (`"item_reg_9"` means 9). `#[serde(untagged)]` lets either shape
/// deserialize without a type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// EffectRequest
// ---------------------------------------------------------------------------

/// A request from the controller to apply one effect.
///
/// Lives for a single read cycle: it is decoded, resolved into slot values,
/// and dropped. Only its `id` outlives the cycle, as the id to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EffectRequest {
    /// The controller's request id, echoed back in the acknowledgement.
    pub id: i64,

    /// Which effect to apply.
    pub code: Identifier,

    /// Effect arguments, in the order the game expects them.
    pub parameters: Vec<Identifier>,
}

/// An [`EffectRequest`] with every identifier resolved to its slot value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub id: i64,
    pub effect_id: u16,
    pub parameters: Vec<u16>,
}

impl EffectRequest {
    /// Resolves `code` and every parameter with
    /// [`parse_effect_id`](crate::parse_effect_id).
    ///
    /// # Errors
    /// Fails on the first identifier that doesn't resolve, or with
    /// [`ProtocolError::TooManyParameters`] when there are more than
    /// [`MAX_PARAMETERS`].
    pub fn resolve(&self) -> Result<ResolvedRequest, ProtocolError> {
        if self.parameters.len() > MAX_PARAMETERS {
            return Err(ProtocolError::TooManyParameters {
                count: self.parameters.len(),
                max: MAX_PARAMETERS,
            });
        }

        let effect_id = crate::parse_effect_id(&self.code)?;
        let parameters = self
            .parameters
            .iter()
            .map(crate::parse_effect_id)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResolvedRequest {
            id: self.id,
            effect_id,
            parameters,
        })
    }
}

// ---------------------------------------------------------------------------
// Acknowledgement
// ---------------------------------------------------------------------------

/// Outcome reported back to the controller for one request.
///
/// Serialized as its bare integer code (`"status":1`), via the
/// `u8` conversions below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EffectStatus {
    /// The game applied the effect.
    Success,
    /// The game could not apply the effect.
    Failure,
    /// The effect can't be applied in the current game state.
    Unavailable,
    /// The controller should send the request again later.
    Retry,
}

impl EffectStatus {
    /// Returns the integer code used on the wire.
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Unavailable => 2,
            Self::Retry => 3,
        }
    }
}

impl From<EffectStatus> for u8 {
    fn from(status: EffectStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for EffectStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Success),
            1 => Ok(Self::Failure),
            2 => Ok(Self::Unavailable),
            3 => Ok(Self::Retry),
            other => Err(format!("unknown effect status {other}")),
        }
    }
}

impl fmt::Display for EffectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Unavailable => "unavailable",
            Self::Retry => "retry",
        };
        f.write_str(name)
    }
}

/// The device's answer to a request: `{id, message, status}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub id: i64,
    pub message: String,
    pub status: EffectStatus,
}

impl Acknowledgement {
    /// Builds an acknowledgement carrying the standard [`ACK_MESSAGE`].
    pub fn new(id: i64, status: EffectStatus) -> Self {
        Self {
            id,
            message: ACK_MESSAGE.to_string(),
            status,
        }
    }
}
