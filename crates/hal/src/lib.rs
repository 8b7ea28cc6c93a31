//! Register-level access to the input port, output port and UART of the
//! demo SoC, plus the switch-driven control loop that runs on it.
//!
//! Everything here is `no_std` and allocation free. The same code runs on
//! the target (over [`Mmio`] blocks) and on the host simulator (over any
//! other [`RegisterBlock`]).
#![cfg_attr(not(test), no_std)]

pub mod control;
pub mod factorial;
pub mod poll;
pub mod port;
pub mod regs;
pub mod uart;

pub use control::{Controller, Phase, BEACON, ERROR_FLAG};
pub use factorial::factorial;
pub use poll::{spin_until, Poll};
pub use port::{InputPort, OutputPort};
pub use regs::{Mmio, RegisterBlock, IPORT_BASE, OPORT_BASE, UART_BASE};
pub use uart::{Uart, UartStatus};

#[cfg(test)]
mod testing;
