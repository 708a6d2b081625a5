//! The Crowd Control EXI device.
//!
//! Writes from the game carry one status byte and drive the session; reads
//! from the game refresh the request queue from the controller and copy it
//! out. The flow for a read is:
//!   1. Reset the queue
//!   2. If disconnected, stop: the all-zero queue means "not connected"
//!   3. Poll the transport once and take at most one message
//!   4. Classify it: none, unknown, or an effect with parameters
//!   5. Refuse effects outside a match, acknowledging them as failed
//!   6. Copy the queue into guest memory

use crowdcontrol_protocol::{
    Acknowledgement, EffectStatus, MessageFramer, decode_request, encode_ack, request_id_hint,
};
use crowdcontrol_session::{Command, SessionState};
use crowdcontrol_transport::{TcpTransport, Transport};

use crate::exi::{ExiDevice, GuestMemory, WriteOutcome};
use crate::queue::{Classification, RequestQueue};
use crate::{BridgeConfig, BridgeError};

/// An EXI device that relays effect requests from a Crowd Control
/// controller to the game, and the game's results back.
///
/// The device exclusively owns its session, queue, and transport. The host
/// calls it serially, so nothing here is shared or locked.
pub struct CrowdControlDevice<T: Transport = TcpTransport> {
    config: BridgeConfig,
    transport: T,
    session: SessionState,
    queue: RequestQueue,
    framer: MessageFramer,
}

impl CrowdControlDevice<TcpTransport> {
    /// Creates a device that talks to the controller over TCP.
    ///
    /// Nothing is dialed until the game reports that it started.
    pub fn new(config: BridgeConfig) -> Self {
        let transport = TcpTransport::new(config.controller_addr, config.connect_timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> CrowdControlDevice<T> {
    /// Creates a device on top of an arbitrary transport.
    pub fn with_transport(config: BridgeConfig, transport: T) -> Self {
        tracing::info!(controller = %config.controller_addr, "crowd control device created");
        let framer = MessageFramer::new(config.max_message_len);
        Self {
            config,
            transport,
            session: SessionState::new(),
            queue: RequestQueue::new(),
            framer,
        }
    }

    /// The session as of the last command.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// The queue as of the last read.
    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// The underlying transport. Mostly useful for inspecting a test
    /// transport after driving the device.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The configuration the device was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    /// Interprets one status byte from the game.
    ///
    /// # Errors
    /// Returns [`SessionError::UnknownCommand`](crowdcontrol_session::SessionError)
    /// for bytes outside the command table. Everything else is handled
    /// here and only logged.
    pub fn handle_status_byte(&mut self, byte: u8) -> Result<(), BridgeError> {
        let command = Command::try_from(byte)?;
        self.handle_command(command);
        Ok(())
    }

    /// Applies a command to the session.
    pub fn handle_command(&mut self, command: Command) {
        tracing::info!(%command, "game status");

        match command {
            Command::Unknown => {
                tracing::debug!("game wrote the unknown status byte");
            }
            Command::GameStarted => {
                let connected = self.connect();
                self.session.record_connect(connected);
            }
            Command::GameEnded => {
                self.disconnect();
            }
            Command::MatchStarted => {
                if !self.session.is_connected() {
                    let connected = self.connect();
                    self.session.record_connect(connected);
                }
                self.session.start_match();
            }
            Command::MatchEnded => {
                if !self.session.end_match() {
                    tracing::debug!("match ended while not in a match");
                }
            }
            Command::EffectSuccess
            | Command::EffectFailure
            | Command::EffectUnavailable
            | Command::EffectRetry => {
                if let Some(status) = command.result_status() {
                    self.acknowledge(status);
                }
            }
        }

        tracing::debug!(phase = %self.session.phase(), "session updated");
    }

    fn connect(&mut self) -> bool {
        match self.transport.connect() {
            Ok(id) => {
                tracing::debug!(%id, "crowd control link up");
                self.framer.clear();
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not connect to crowd control");
                false
            }
        }
    }

    fn disconnect(&mut self) {
        self.transport.disconnect();
        self.framer.clear();
        self.queue.clear();
        self.session.mark_disconnected();
    }

    /// Sends the pending request's acknowledgement, logging any failure.
    fn acknowledge(&mut self, status: EffectStatus) {
        if let Err(e) = self.try_acknowledge(status) {
            tracing::warn!(error = %e, %status, "could not send acknowledgement");
        }
    }

    fn try_acknowledge(&mut self, status: EffectStatus) -> Result<(), BridgeError> {
        let Some(id) = self.session.take_pending_request() else {
            tracing::warn!(%status, "effect result with no pending request");
            return Ok(());
        };

        let ack = Acknowledgement {
            id,
            message: self.config.ack_message.clone(),
            status,
        };
        let bytes = encode_ack(&ack)?;
        tracing::debug!(
            ack = %String::from_utf8_lossy(&bytes[..bytes.len() - 1]),
            "sending acknowledgement"
        );
        self.transport.send(&bytes)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------------

    /// Rebuilds the queue for one read cycle and returns it.
    ///
    /// Any request left in the queue from the previous cycle is discarded.
    pub fn refresh(&mut self) -> &RequestQueue {
        self.queue.clear();

        if !self.session.is_connected() {
            return &self.queue;
        }

        self.poll_request();

        if let Classification::Effect(effect_id) = self.queue.classification() {
            if self.session.can_grant() {
                tracing::debug!(effect_id, "granting effect");
            } else {
                tracing::warn!(effect_id, "not in a match, refusing effect");
                self.queue.set_classification(Classification::None);
                self.acknowledge(EffectStatus::Failure);
            }
        }

        &self.queue
    }

    /// Fills the queue from at most one controller message.
    ///
    /// Only as many bytes as the framer has room for are taken off the
    /// transport. A controller that sends faster than the game reads backs
    /// up in the socket, not in the device.
    fn poll_request(&mut self) {
        let room = self.framer.room();
        let received = if room == 0 {
            tracing::trace!(buffered = self.framer.buffered(), "framer full, not polling");
            Ok(None)
        } else {
            self.transport.try_recv(room)
        };

        match received {
            Ok(Some(data)) => self.framer.push(&data),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "could not poll crowd control");
                self.queue.set_classification(Classification::None);
                return;
            }
        }

        match self.framer.next_message() {
            Ok(Some(message)) => self.load_message(&message),
            Ok(None) => {
                tracing::trace!("no pending request");
                self.queue.set_classification(Classification::None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropped inbound message");
                self.queue.set_classification(Classification::Unknown);
            }
        }
    }

    fn load_message(&mut self, message: &[u8]) {
        tracing::debug!(message = %String::from_utf8_lossy(message), "request received");

        let request = match decode_request(message) {
            Ok(request) => request,
            Err(e) => {
                if let Some(id) = request_id_hint(message) {
                    self.session.remember_request(id);
                }
                tracing::warn!(error = %e, "undecodable request");
                self.queue.set_classification(Classification::Unknown);
                return;
            }
        };

        self.session.remember_request(request.id);

        let resolved = match request.resolve() {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(id = request.id, error = %e, "unresolvable request");
                self.queue.set_classification(Classification::Unknown);
                return;
            }
        };

        match Classification::from_slot(resolved.effect_id) {
            Classification::Effect(effect_id) => {
                self.queue.load_effect(effect_id, &resolved.parameters);
            }
            reserved => {
                tracing::warn!(
                    id = resolved.id,
                    effect_id = resolved.effect_id,
                    ?reserved,
                    "effect code collides with a reserved classification"
                );
                self.queue.set_classification(Classification::Unknown);
            }
        }
    }
}

impl<T: Transport> ExiDevice for CrowdControlDevice<T> {
    fn dma_write(&mut self, memory: &dyn GuestMemory, address: u32, size: u32) -> WriteOutcome {
        tracing::trace!(address, size, "dma write");

        // First byte is the command; the rest of the payload is unused.
        let Some(&byte) = memory.read(address, size).and_then(|bytes| bytes.first()) else {
            tracing::warn!(address, size, "invalid address in dma write");
            return WriteOutcome::Handled;
        };

        match self.handle_status_byte(byte) {
            Ok(()) => WriteOutcome::Handled,
            Err(e) => {
                tracing::debug!(error = %e, "passing write to default handling");
                WriteOutcome::Unhandled(byte)
            }
        }
    }

    fn dma_read(&mut self, memory: &mut dyn GuestMemory, address: u32, size: u32) {
        tracing::trace!(address, size, "dma read");

        // Check the range before sizing a buffer from a guest-supplied length.
        if memory.read(address, size).is_none() {
            tracing::warn!(address, size, "invalid address in dma read");
            return;
        }

        let mut out = vec![0u8; size as usize];
        self.refresh().copy_into(&mut out);
        if !memory.write(address, &out) {
            tracing::warn!(address, size, "invalid address in dma read");
        }
    }

    fn is_present(&self) -> bool {
        true
    }
}
