//! The request mailbox the game reads.
//!
//! Despite the name, [`RequestQueue`] holds at most one request. It is
//! rebuilt from scratch on every DMA read, so a request the game doesn't
//! act on in the cycle it was read is gone: the controller learns nothing
//! about it unless the game writes a result byte. Games must read once per
//! decision point.
//!
//! Layout, as 16-bit big-endian slots (the guest's byte order):
//!
//! ```text
//! slot 0      classification: 0 not connected, 1 none, 2 unknown, ≥3 effect id
//! slots 1..=4 effect parameters, zero when unused
//! ```

use crowdcontrol_protocol::MAX_PARAMETERS;

/// Number of 16-bit slots: the classification plus the parameters.
pub const QUEUE_SLOTS: usize = 1 + MAX_PARAMETERS;

/// Size of the queue in guest memory.
pub const QUEUE_BYTES: usize = QUEUE_SLOTS * 2;

/// What slot 0 tells the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No link to the controller.
    NotConnected,
    /// Connected, but there's nothing to do (or polling failed).
    None,
    /// A message arrived and couldn't be understood.
    Unknown,
    /// Apply this effect. Always `>= 3`.
    Effect(u16),
}

impl Classification {
    /// Interprets a slot value.
    pub fn from_slot(value: u16) -> Self {
        match value {
            0 => Self::NotConnected,
            1 => Self::None,
            2 => Self::Unknown,
            id => Self::Effect(id),
        }
    }

    /// The slot value for this classification.
    pub fn slot(self) -> u16 {
        match self {
            Self::NotConnected => 0,
            Self::None => 1,
            Self::Unknown => 2,
            Self::Effect(id) => id,
        }
    }
}

/// Single-slot mailbox of 16-bit values handed to the game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestQueue {
    slots: [u16; QUEUE_SLOTS],
}

impl RequestQueue {
    /// An all-zero queue, which the game reads as "not connected".
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes every slot, which reads as "not connected".
    pub fn clear(&mut self) {
        self.slots = [0; QUEUE_SLOTS];
    }

    /// The five logical slot values, before byte-order conversion.
    ///
    /// Slot 0 is the classification or effect id; slots 1 to 4 are the
    /// effect's parameters.
    pub fn slots(&self) -> &[u16; QUEUE_SLOTS] {
        &self.slots
    }

    /// Interprets slot 0.
    pub fn classification(&self) -> Classification {
        Classification::from_slot(self.slots[0])
    }

    /// Overwrites slot 0, leaving the parameters alone.
    pub fn set_classification(&mut self, classification: Classification) {
        self.slots[0] = classification.slot();
    }

    /// Loads an effect and its parameters. Parameters past the last slot
    /// are ignored; requests are checked against [`MAX_PARAMETERS`] long
    /// before they get here.
    pub fn load_effect(&mut self, effect_id: u16, parameters: &[u16]) {
        self.slots[0] = effect_id;
        for (slot, &param) in self.slots[1..].iter_mut().zip(parameters) {
            *slot = param;
        }
    }

    /// The queue as the guest sees it: each slot big-endian.
    pub fn to_bytes(&self) -> [u8; QUEUE_BYTES] {
        let mut bytes = [0u8; QUEUE_BYTES];
        for (chunk, slot) in bytes.chunks_exact_mut(2).zip(self.slots) {
            chunk.copy_from_slice(&slot.to_be_bytes());
        }
        bytes
    }

    /// Fills `out` with the queue bytes, truncating or zero-padding to its
    /// length.
    pub fn copy_into(&self, out: &mut [u8]) {
        let bytes = self.to_bytes();
        let n = out.len().min(QUEUE_BYTES);
        out[..n].copy_from_slice(&bytes[..n]);
        out[n..].fill(0);
    }
}
