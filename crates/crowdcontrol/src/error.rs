//! Unified error type for the Crowd Control bridge.

use crowdcontrol_protocol::ProtocolError;
use crowdcontrol_session::SessionError;
use crowdcontrol_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The device never hands these to the host: DMA calls have no error
/// channel. They surface in logs, and as the classification codes the
/// game reads back.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (decode, identifiers, framing).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (unrecognized command byte).
    #[error(transparent)]
    Session(#[from] SessionError),
}
