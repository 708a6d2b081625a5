//! The host's side of the device boundary.
//!
//! An emulator exposes memory-mapped peripherals to the guest. When the
//! guest starts a DMA transfer the host calls into the device with a guest
//! address and a size, and the device moves bytes through [`GuestMemory`].
//! [`ExiDevice`] is that capability: the host owns the device, calls these
//! methods one at a time from its emulation thread, and never sees anything
//! else of the bridge.

/// Byte access to the guest's address space.
pub trait GuestMemory {
    /// Borrows `size` bytes starting at `address`, or `None` if any part of
    /// that range isn't mapped.
    fn read(&self, address: u32, size: u32) -> Option<&[u8]>;

    /// Copies `data` to `address`. Returns `false` if the range isn't
    /// mapped, in which case nothing is written.
    fn write(&mut self, address: u32, data: &[u8]) -> bool;
}

/// What the device did with a DMA write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The device consumed the write (or rejected it and logged why).
    Handled,
    /// The command byte isn't one the device knows; the host should apply
    /// its default handling for the write.
    Unhandled(u8),
}

/// A peripheral the host can attach to an EXI slot.
pub trait ExiDevice {
    /// Guest → device: the guest wrote `size` bytes at `address`.
    fn dma_write(&mut self, memory: &dyn GuestMemory, address: u32, size: u32) -> WriteOutcome;

    /// Device → guest: the guest wants `size` bytes written at `address`.
    fn dma_read(&mut self, memory: &mut dyn GuestMemory, address: u32, size: u32);

    /// Whether the device answers on the bus.
    fn is_present(&self) -> bool;
}

/// A contiguous block of guest RAM starting at `base`.
///
/// Enough for hosts whose memory map is a single flat region, and for
/// driving a device in tests.
#[derive(Debug, Clone)]
pub struct FlatMemory {
    base: u32,
    bytes: Vec<u8>,
}

impl FlatMemory {
    /// Creates `len` zeroed bytes mapped at `base`.
    pub fn new(base: u32, len: usize) -> Self {
        Self {
            base,
            bytes: vec![0; len],
        }
    }

    /// Returns the whole region.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    fn range(&self, address: u32, len: usize) -> Option<std::ops::Range<usize>> {
        let start = usize::try_from(address.checked_sub(self.base)?).ok()?;
        let end = start.checked_add(len)?;
        (end <= self.bytes.len()).then_some(start..end)
    }
}

impl GuestMemory for FlatMemory {
    fn read(&self, address: u32, size: u32) -> Option<&[u8]> {
        let range = self.range(address, usize::try_from(size).ok()?)?;
        Some(&self.bytes[range])
    }

    fn write(&mut self, address: u32, data: &[u8]) -> bool {
        match self.range(address, data.len()) {
            Some(range) => {
                self.bytes[range].copy_from_slice(data);
                true
            }
            None => false,
        }
    }
}
