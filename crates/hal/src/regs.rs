//! Word-addressed register blocks.

/// Input port (switches), one read-only data word.
pub const IPORT_BASE: usize = 0x4000_0000;
/// Output port, one read/write data word.
pub const OPORT_BASE: usize = 0x5000_0000;
/// UART: word 0 is transmit data, word 1 is status.
pub const UART_BASE: usize = 0x6000_0000;

/// A block of 32-bit device registers, indexed by word offset.
///
/// Implementations must perform every access: a read is a fresh observation
/// of the device and a write always reaches it, in program order.
pub trait RegisterBlock {
    fn read(&self, word: usize) -> u32;
    fn write(&mut self, word: usize, value: u32);
}

impl<R: RegisterBlock + ?Sized> RegisterBlock for &mut R {
    fn read(&self, word: usize) -> u32 {
        (**self).read(word)
    }

    fn write(&mut self, word: usize, value: u32) {
        (**self).write(word, value)
    }
}

/// Memory-mapped register block at a fixed physical address.
#[derive(Debug)]
pub struct Mmio {
    base: *mut u32,
}

impl Mmio {
    /// # Safety
    /// `base` must be the word-aligned address of a device register block
    /// that is valid for volatile access at every offset the caller uses,
    /// and no other `Mmio` may alias it.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            base: base as *mut u32,
        }
    }

    pub fn base(&self) -> usize {
        self.base as usize
    }
}

impl RegisterBlock for Mmio {
    #[inline]
    fn read(&self, word: usize) -> u32 {
        // SAFETY: validity of the block is the contract of `Mmio::new`.
        unsafe { core::ptr::read_volatile(self.base.add(word)) }
    }

    #[inline]
    fn write(&mut self, word: usize, value: u32) {
        // SAFETY: as above.
        unsafe { core::ptr::write_volatile(self.base.add(word), value) }
    }
}
