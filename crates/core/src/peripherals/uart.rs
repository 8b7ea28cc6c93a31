use crate::SimResult;
use std::any::Any;
use std::cell::Cell;
use switchport_hal::UartStatus;

/// Transmit-only UART.
/// Writes to the data register (offset 0x0) are captured; the status
/// register (offset 0x4) reports TX ready in bit 0.
///
/// After each transmit the device stays busy for `tx_latency` status reads,
/// which is how the firmware's busy-wait gets exercised.
#[derive(Debug, Default)]
pub struct Uart {
    tx_latency: u32,
    busy_reads: Cell<u32>,
    sink: Vec<u8>,
    echo_stdout: bool,
}

impl Uart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(tx_latency: u32) -> Self {
        Self {
            tx_latency,
            ..Self::default()
        }
    }

    /// Also print transmitted bytes on the host's stdout.
    pub fn set_echo_stdout(&mut self, echo: bool) {
        self.echo_stdout = echo;
    }

    pub fn output(&self) -> &[u8] {
        &self.sink
    }

    fn status(&self) -> UartStatus {
        let busy = self.busy_reads.get();
        if busy > 0 {
            self.busy_reads.set(busy - 1);
            UartStatus::empty()
        } else {
            UartStatus::TX_READY
        }
    }
}

impl crate::Peripheral for Uart {
    fn read(&self, offset: u64) -> SimResult<u32> {
        match offset {
            0x04 => Ok(self.status().bits()),
            _ => Ok(0),
        }
    }

    fn write(&mut self, offset: u64, value: u32) -> SimResult<()> {
        if offset == 0x00 {
            let byte = (value & 0xFF) as u8;
            if self.busy_reads.get() > 0 {
                tracing::warn!("UART: byte {:#04x} written while busy", byte);
            }
            self.sink.push(byte);
            if self.echo_stdout {
                use std::io::Write;
                let mut out = std::io::stdout();
                let _ = out.write_all(&[byte]);
                let _ = out.flush();
            }
            self.busy_reads.set(self.tx_latency);
        }
        Ok(())
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "tx": String::from_utf8_lossy(&self.sink),
            "tx_latency": self.tx_latency,
        })
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}
