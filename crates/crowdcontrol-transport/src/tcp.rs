//! TCP transport implementation using `std::net`.
//!
//! The stream is put in non-blocking mode right after connecting so that
//! [`Transport::try_recv`] can poll it. Sends flip it back to blocking for
//! the duration of the write; acknowledgements are small and the game
//! expects them to be on the wire before the write call returns.
//!
//! A blocking write to a peer that has stopped reading would otherwise wait
//! forever once the send buffer fills, so the stream carries a write
//! timeout equal to the connect timeout. A send that hits it fails with
//! [`TransportError::SendFailed`].

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::{ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Size of each read from the socket.
const READ_CHUNK: usize = 512;


/// A TCP-based [`Transport`] that dials the controller.
#[derive(Debug)]
pub struct TcpTransport {
    addr: SocketAddr,
    connect_timeout: Duration,
    stream: Option<TcpStream>,
    id: Option<ConnectionId>,
}

impl TcpTransport {
    /// Creates an unconnected transport that will dial `addr`.
    pub fn new(addr: SocketAddr, connect_timeout: Duration) -> Self {
        Self {
            addr,
            connect_timeout,
            stream: None,
            id: None,
        }
    }

    /// Returns the controller address this transport dials.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the id of the open link, if any.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.id
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream, TransportError> {
        self.stream.as_mut().ok_or(TransportError::NotConnected)
    }

    /// Forgets the stream after the peer went away.
    fn drop_stream(&mut self) {
        if let Some(id) = self.id.take() {
            tracing::info!(%id, "controller closed the connection");
        }
        self.stream = None;
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> Result<ConnectionId, TransportError> {
        self.disconnect();

        let stream = TcpStream::connect_timeout(&self.addr, self.connect_timeout)
            .map_err(TransportError::ConnectFailed)?;
        stream
            .set_nodelay(true)
            .map_err(TransportError::ConnectFailed)?;
        stream
            .set_write_timeout(Some(self.connect_timeout))
            .map_err(TransportError::ConnectFailed)?;
        stream
            .set_nonblocking(true)
            .map_err(TransportError::ConnectFailed)?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::info!(%id, addr = %self.addr, "connected to controller");

        self.stream = Some(stream);
        self.id = Some(id);
        Ok(id)
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            // The peer may already be gone; nothing useful to do about it.
            let _ = stream.shutdown(Shutdown::Both);
        }
        if let Some(id) = self.id.take() {
            tracing::info!(%id, "disconnected from controller");
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream_mut()?;

        stream
            .set_nonblocking(false)
            .map_err(TransportError::SendFailed)?;
        let written = stream.write_all(data).and_then(|()| stream.flush());
        let restored = stream.set_nonblocking(true);

        written.map_err(TransportError::SendFailed)?;
        restored.map_err(TransportError::SendFailed)
    }

    fn try_recv(&mut self, limit: usize) -> Result<Option<Vec<u8>>, TransportError> {
        let stream = self.stream_mut()?;

        let mut received = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        let mut closed = false;

        while received.len() < limit {
            let want = READ_CHUNK.min(limit - received.len());
            match stream.read(&mut chunk[..want]) {
                Ok(0) => {
                    closed = true;
                    break;
                }
                Ok(n) => received.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::ReceiveFailed(e)),
            }
        }

        if closed {
            if received.is_empty() {
                self.drop_stream();
                return Err(TransportError::ConnectionClosed);
            }
            // Hand over what arrived before the FIN; the next poll reports
            // the close.
            return Ok(Some(received));
        }

        if received.is_empty() {
            Ok(None)
        } else {
            Ok(Some(received))
        }
    }
}
