use crate::{spin_until, RegisterBlock};
use bitflags::bitflags;

const DATA: usize = 0;
const STATUS: usize = 1;

bitflags! {
    /// UART status register (word 1).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UartStatus: u32 {
        const TX_READY = 1 << 0;
    }
}

/// Transmit side of the UART.
#[derive(Debug)]
pub struct Uart<R> {
    regs: R,
}

impl<R: RegisterBlock> Uart<R> {
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    pub fn status(&self) -> UartStatus {
        UartStatus::from_bits_truncate(self.regs.read(STATUS))
    }

    pub fn is_ready(&self) -> bool {
        self.status().contains(UartStatus::TX_READY)
    }

    /// Blocks until the transmitter is ready, then hands it `c`.
    pub fn send(&mut self, c: u8) {
        spin_until(|| self.is_ready());
        self.regs.write(DATA, c as u32);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.send(b);
        }
    }
}
