//! Error types for the protocol layer.
//!
//! Everything that can go wrong between "bytes arrived from the controller"
//! and "we know which effect and parameters were asked for" lands here.
//! The device maps all of them to the UNKNOWN classification, so the
//! variants exist mostly for the logs.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The message was not JSON at all: bad syntax, truncated text, or
    /// invalid UTF-8.
    #[error("invalid json: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The message was JSON but `id`, `code` or `parameters` was absent or
    /// had the wrong type.
    #[error("missing or invalid fields: {0}")]
    MissingFields(#[source] serde_json::Error),

    /// A string identifier had no numeric segment after its last `_`.
    ///
    /// `"give_stocks_3"` is fine; `"give_stocks"` and `"give_"` are not.
    #[error("malformed identifier {0:?}: expected a numeric suffix")]
    MalformedIdentifier(String),

    /// An identifier resolved to a number that doesn't fit a 16-bit slot.
    #[error("identifier {0} does not fit in a 16-bit slot")]
    IdentifierOutOfRange(i64),

    /// The request carried more parameters than the game reads.
    #[error("too many parameters: {count} (max {max})")]
    TooManyParameters { count: usize, max: usize },

    /// A message grew past the configured size limit and was dropped.
    #[error("message of {len} bytes exceeds the {max}-byte limit")]
    MessageTooLarge { len: usize, max: usize },

    /// Serializing an outbound acknowledgement failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}
