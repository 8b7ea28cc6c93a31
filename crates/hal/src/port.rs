//! Input and output port capabilities.

use crate::RegisterBlock;

const DATA: usize = 0;

/// The switch bank. Read only; every read goes to the device.
#[derive(Debug)]
pub struct InputPort<R> {
    regs: R,
}

impl<R: RegisterBlock> InputPort<R> {
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    pub fn read_switches(&self) -> u32 {
        self.regs.read(DATA)
    }
}

/// The driven output register. Reading back returns the last value written.
#[derive(Debug)]
pub struct OutputPort<R> {
    regs: R,
}

impl<R: RegisterBlock> OutputPort<R> {
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    pub fn write_out(&mut self, value: u32) {
        self.regs.write(DATA, value);
    }

    pub fn read_out(&self) -> u32 {
        self.regs.read(DATA)
    }
}
