//! Transport abstraction layer for the Crowd Control bridge.
//!
//! Provides the [`Transport`] trait: the narrow set of operations the bridge
//! needs from its link to the external controller. The device never touches
//! sockets directly, which lets tests swap in a scripted transport.
//!
//! All operations are synchronous and bounded in time, because the host
//! calls into the device from its emulation thread:
//!
//! - [`Transport::try_recv`] never blocks. A poll that finds nothing returns
//!   `Ok(None)` immediately, and a poll never takes more bytes than the
//!   caller has room for. Whatever is left stays in the socket.
//! - [`Transport::send`] may wait for the peer, but only up to a deadline
//!   chosen by the implementation.
//!
//! # Feature Flags
//!
//! - `tcp` (default): plain TCP transport via `std::net`

mod error;
#[cfg(feature = "tcp")]
mod tcp;

pub use error::TransportError;
#[cfg(feature = "tcp")]
pub use tcp::TcpTransport;

use std::fmt;

/// Opaque identifier for one established link.
///
/// Every successful [`Transport::connect`] gets a fresh id so the logs can
/// tell reconnects apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link-{}", self.0)
    }
}

/// A client-side link to the controller that can send and receive bytes.
pub trait Transport: Send + 'static {
    /// Opens the link. An already-open link is dropped and reopened.
    fn connect(&mut self) -> Result<ConnectionId, TransportError>;

    /// Closes the link. Closing a link that is not open is a no-op.
    fn disconnect(&mut self);

    /// Returns `true` while a link is open.
    fn is_connected(&self) -> bool;

    /// Sends `data` to the controller, blocking until it is written or the
    /// implementation's write deadline passes.
    ///
    /// # Errors
    /// [`TransportError::NotConnected`] without a link, and
    /// [`TransportError::SendFailed`] when the write fails or times out.
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Drains up to `limit` bytes that are currently available, without
    /// blocking.
    ///
    /// Returns `Ok(None)` when nothing is pending or `limit` is zero. Bytes
    /// are returned as they arrived; message boundaries are the caller's
    /// concern.
    ///
    /// # Errors
    /// [`TransportError::ConnectionClosed`] once the peer has gone away and
    /// everything it sent has been handed over.
    fn try_recv(&mut self, limit: usize) -> Result<Option<Vec<u8>>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "link-7");
    }

    #[test]
    fn test_connection_id_equality() {
        assert_eq!(ConnectionId::new(1), ConnectionId::new(1));
        assert_ne!(ConnectionId::new(1), ConnectionId::new(2));
    }

    #[test]
    fn test_transport_error_messages() {
        assert_eq!(TransportError::NotConnected.to_string(), "not connected");
        assert_eq!(
            TransportError::ConnectionClosed.to_string(),
            "connection closed by peer"
        );
    }
}
