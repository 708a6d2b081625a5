//! Wire protocol for the Crowd Control bridge.
//!
//! This crate defines what the controller and the device say to each other:
//!
//! - **Types** ([`EffectRequest`], [`Identifier`], [`Acknowledgement`],
//!   [`EffectStatus`]): the messages that travel on the wire.
//! - **Codec** ([`parse_effect_id`], [`decode_request`], [`encode_ack`]):
//!   how those messages are converted to/from bytes.
//! - **Framing** ([`MessageFramer`]): how a byte stream becomes messages.
//! - **Errors** ([`ProtocolError`]): what can go wrong along the way.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the device
//! (slot values handed to the game). It doesn't know about sockets or
//! guest memory.
//!
//! ```text
//! Transport (bytes) → Protocol (EffectRequest) → Device (request queue)
//! ```

mod codec;
mod error;
mod framing;
mod types;

pub use codec::{decode_request, encode_ack, parse_effect_id, request_id_hint};
pub use error::ProtocolError;
pub use framing::MessageFramer;
pub use types::{
    ACK_MESSAGE, Acknowledgement, EffectRequest, EffectStatus, Identifier, MAX_PARAMETERS,
    ResolvedRequest,
};
