use crate::SimResult;
use std::any::Any;

/// The output port. Holds the last word written and remembers every write
/// so a run can be checked afterwards.
#[derive(Debug, Default)]
pub struct OutputRegister {
    value: u32,
    history: Vec<u32>,
}

impl OutputRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn history(&self) -> &[u32] {
        &self.history
    }
}

impl crate::Peripheral for OutputRegister {
    fn read(&self, offset: u64) -> SimResult<u32> {
        match offset {
            0x00 => Ok(self.value),
            _ => Ok(0),
        }
    }

    fn write(&mut self, offset: u64, value: u32) -> SimResult<()> {
        if offset == 0x00 {
            tracing::debug!("Output: {:#010x}", value);
            self.value = value;
            self.history.push(value);
        }
        Ok(())
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "value": self.value,
            "writes": self.history.len(),
        })
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}
