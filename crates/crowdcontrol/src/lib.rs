//! # Crowd Control EXI bridge
//!
//! An emulated peripheral that lets a game running in an emulator take
//! "crowd control" effect requests from an external controller process.
//!
//! The game drives everything through two DMA operations on the device:
//!
//! - **Writes** carry a single status byte: game started/ended, match
//!   started/ended, or the result of the last effect. They move the
//!   session along and send acknowledgements to the controller.
//! - **Reads** return the [`RequestQueue`]: whether there is a request,
//!   and if so which effect and parameters to apply.
//!
//! ```text
//! game ──dma_write──→ CrowdControlDevice ──ack json──→ controller
//! game ←──dma_read─── CrowdControlDevice ←─request json── controller
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crowdcontrol::prelude::*;
//!
//! let mut device = CrowdControlDevice::new(BridgeConfig::default());
//! let mut memory = FlatMemory::new(0x8000_0000, 0x100);
//!
//! // The game reports that it booted...
//! memory.write(0x8000_0000, &[Command::GameStarted.byte()]);
//! device.dma_write(&memory, 0x8000_0000, 1);
//!
//! // ...and later polls for a request.
//! device.dma_read(&mut memory, 0x8000_0010, QUEUE_BYTES as u32);
//! ```

mod config;
mod device;
mod error;
mod exi;
mod queue;

pub use config::{BridgeConfig, DEFAULT_CONTROLLER_PORT};
pub use device::CrowdControlDevice;
pub use error::BridgeError;
pub use exi::{ExiDevice, FlatMemory, GuestMemory, WriteOutcome};
pub use queue::{Classification, QUEUE_BYTES, QUEUE_SLOTS, RequestQueue};

/// Everything a host needs to attach the device and drive it, in one import.
///
/// ```
/// use crowdcontrol::prelude::*;
///
/// let device = CrowdControlDevice::new(BridgeConfig::default());
/// assert!(device.is_present());
/// assert_eq!(device.session().phase(), SessionPhase::Disconnected);
/// ```
pub mod prelude {
    pub use crowdcontrol_protocol::{Acknowledgement, EffectStatus};
    pub use crowdcontrol_session::{Command, SessionPhase, SessionState};
    pub use crowdcontrol_transport::{TcpTransport, Transport};

    pub use crate::{
        BridgeConfig, BridgeError, Classification, CrowdControlDevice, ExiDevice, FlatMemory,
        GuestMemory, QUEUE_BYTES, RequestQueue, WriteOutcome,
    };
}
