//! Conversions between controller JSON and Rust values.
//!
//! Three operations make up the codec:
//!
//! - [`parse_effect_id`] turns an [`Identifier`] into a 16-bit slot value.
//! - [`decode_request`] turns one inbound message into an [`EffectRequest`].
//! - [`encode_ack`] turns an [`Acknowledgement`] into outbound bytes.

use serde_json::error::Category;

use crate::{Acknowledgement, EffectRequest, Identifier, ProtocolError};

/// Separator between the descriptive part of a string identifier and its
/// numeric suffix.
const ID_SEPARATOR: char = '_';

/// Resolves an identifier to the number the game uses.
///
/// Numbers pass through. Strings are split on `_` and the last segment is
/// parsed: `"give_stocks_3"` is 3, `"player_2"` is 2, `"7"` is 7.
///
/// # Errors
/// - [`ProtocolError::MalformedIdentifier`] if the last segment isn't an
///   integer.
/// - [`ProtocolError::IdentifierOutOfRange`] if the number doesn't fit
///   in a `u16`.
pub fn parse_effect_id(value: &Identifier) -> Result<u16, ProtocolError> {
    let raw = match value {
        Identifier::Number(n) => *n,
        Identifier::Text(text) => {
            let suffix = text.rsplit(ID_SEPARATOR).next().unwrap_or(text);
            suffix
                .parse::<i64>()
                .map_err(|_| ProtocolError::MalformedIdentifier(text.clone()))?
        }
    };
    u16::try_from(raw).map_err(|_| ProtocolError::IdentifierOutOfRange(raw))
}

/// Decodes one message from the controller.
///
/// Anything from the first NUL byte on is ignored, so a C-string style
/// terminator (or trailing garbage after one) doesn't break parsing.
///
/// # Errors
/// - [`ProtocolError::InvalidJson`] if the bytes aren't valid JSON text.
/// - [`ProtocolError::MissingFields`] if the JSON lacks `id`, `code` or
///   `parameters`, or one of them has the wrong type.
pub fn decode_request(data: &[u8]) -> Result<EffectRequest, ProtocolError> {
    serde_json::from_slice(until_nul(data)).map_err(|e| match e.classify() {
        Category::Data => ProtocolError::MissingFields(e),
        Category::Io | Category::Syntax | Category::Eof => ProtocolError::InvalidJson(e),
    })
}

/// Pulls the `id` field out of a message that failed full decoding.
///
/// Returns `None` if the message isn't a JSON object with an integer `id`.
pub fn request_id_hint(data: &[u8]) -> Option<i64> {
    let value: serde_json::Value = serde_json::from_slice(until_nul(data)).ok()?;
    value.get("id")?.as_i64()
}

/// Encodes an acknowledgement as JSON text followed by a NUL terminator.
///
/// # Errors
/// Returns [`ProtocolError::Encode`] if serialization fails.
pub fn encode_ack(ack: &Acknowledgement) -> Result<Vec<u8>, ProtocolError> {
    let mut bytes = serde_json::to_vec(ack).map_err(ProtocolError::Encode)?;
    bytes.push(0);
    Ok(bytes)
}

fn until_nul(data: &[u8]) -> &[u8] {
    match data.iter().position(|&b| b == 0) {
        Some(end) => &data[..end],
        None => data,
    }
}
