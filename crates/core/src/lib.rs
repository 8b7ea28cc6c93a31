pub mod bus;
pub mod memory;
pub mod metrics;
pub mod peripherals;
pub mod simulator;
pub mod snapshot;

use std::any::Any;

pub use bus::{BusWindow, SystemBus};
pub use simulator::{ScenarioOutcome, Simulator};


#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("No device mapped at {0:#x}")]
    Unmapped(u64),
    #[error("Misaligned 32-bit access at {0:#x}")]
    Misaligned(u64),
    #[error("Write to read-only register at {0:#x}")]
    ReadOnly(u64),
    #[error("Board has no {0} device")]
    MissingDevice(&'static str),
}

pub type SimResult<T> = Result<T, SimulationError>;

/// Trait for observing bus traffic and controller progress.
pub trait BusObserver: std::fmt::Debug + Send + Sync {
    fn on_read(&self, _addr: u64, _value: u32) {}
    fn on_write(&self, _addr: u64, _value: u32) {}
    fn on_poll(&self, _spinning: bool) {}
}

/// Trait representing a memory-mapped peripheral with 32-bit registers.
///
/// Offsets are byte offsets from the device base and are always word
/// aligned by the time they reach the device.
pub trait Peripheral: std::fmt::Debug {
    fn read(&self, offset: u64) -> SimResult<u32>;
    fn write(&mut self, offset: u64, value: u32) -> SimResult<()>;
    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
}

/// Trait representing the system bus
pub trait Bus {
    fn read_u32(&self, addr: u64) -> SimResult<u32>;
    fn write_u32(&mut self, addr: u64, value: u32) -> SimResult<()>;
}
