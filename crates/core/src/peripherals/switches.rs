use crate::{SimResult, SimulationError};
use std::any::Any;

/// The input port: a bank of 32 switches behind one read-only data word.
///
/// Only the operator (the test harness) changes the value.
#[derive(Debug, Default)]
pub struct SwitchBank {
    value: u32,
}

impl SwitchBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, value: u32) {
        if value != self.value {
            tracing::debug!("Switches: {:#010x} -> {:#010x}", self.value, value);
        }
        self.value = value;
    }
}

impl crate::Peripheral for SwitchBank {
    fn read(&self, offset: u64) -> SimResult<u32> {
        match offset {
            0x00 => Ok(self.value),
            _ => Ok(0),
        }
    }

    fn write(&mut self, offset: u64, _value: u32) -> SimResult<()> {
        Err(SimulationError::ReadOnly(offset))
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({ "switches": self.value })
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}
