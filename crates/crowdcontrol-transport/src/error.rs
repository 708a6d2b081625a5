//! Error types for the transport layer.
//!
//! These describe what happened to the link itself: it was never opened, it
//! couldn't be opened, the controller hung up, or a read or write failed.
//! The I/O variants keep the underlying `std::io::Error` as their source so
//! the logs show the OS reason (refused, reset, timed out).

/// Errors that can occur in the transport layer.
///
/// None of these are fatal to the device. A failed connect leaves the
/// session disconnected, and a failed send or poll is logged and the read
/// cycle carries on as if nothing had arrived.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An operation needed a live connection and there was none.
    #[error("not connected")]
    NotConnected,

    /// Establishing the connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// The remote peer closed the connection.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Sending data failed, including a write that hit the write timeout
    /// because the peer stopped reading.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
