use crate::peripherals::{OutputRegister, SwitchBank, Uart};
use crate::{Bus, BusObserver, Peripheral, SimResult, SimulationError};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use switchport_config::{BoardDescriptor, DeviceKind};
use switchport_hal::RegisterBlock;

pub struct PeripheralEntry {
    pub name: String,
    pub base: u64,
    pub size: u64,
    pub dev: Box<dyn Peripheral>,
}

impl PeripheralEntry {
    fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr - self.base < self.size
    }
}

pub struct SystemBus {
    pub peripherals: Vec<PeripheralEntry>,
    pub observers: Vec<Arc<dyn BusObserver>>,
    faults: Vec<SimulationError>,
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemBus {
    /// The demo SoC map: switches, output port and UART at their fixed bases.
    pub fn new() -> Self {
        let peripherals = vec![
            PeripheralEntry {
                name: "iport".to_string(),
                base: switchport_hal::IPORT_BASE as u64,
                size: 0x4,
                dev: Box::new(SwitchBank::new()),
            },
            PeripheralEntry {
                name: "oport".to_string(),
                base: switchport_hal::OPORT_BASE as u64,
                size: 0x4,
                dev: Box::new(OutputRegister::new()),
            },
            PeripheralEntry {
                name: "uart".to_string(),
                base: switchport_hal::UART_BASE as u64,
                size: 0x8,
                dev: Box::new(Uart::new()),
            },
        ];

        Self {
            peripherals,
            observers: Vec::new(),
            faults: Vec::new(),
        }
    }

    pub fn from_config(board: &BoardDescriptor) -> anyhow::Result<Self> {
        board.validate()?;

        let mut peripherals = Vec::with_capacity(board.devices.len());
        for device in &board.devices {
            let size = device.size_bytes()?;

            let dev: Box<dyn Peripheral> = match device.r#type {
                DeviceKind::InputPort => Box::new(SwitchBank::new()),
                DeviceKind::OutputPort => Box::new(OutputRegister::new()),
                DeviceKind::Uart => Box::new(Uart::with_latency(device.tx_latency()?)),
            };

            tracing::debug!(
                "Mapped {} ({:?}) at {:#x}, {} bytes",
                device.id,
                device.r#type,
                device.base_address,
                size
            );

            peripherals.push(PeripheralEntry {
                name: device.id.clone(),
                base: device.base_address,
                size,
                dev,
            });
        }

        Ok(Self {
            peripherals,
            observers: Vec::new(),
            faults: Vec::new(),
        })
    }

    pub fn add_observer(&mut self, observer: Arc<dyn BusObserver>) {
        self.observers.push(observer);
    }

    fn entry(&self, addr: u64) -> SimResult<&PeripheralEntry> {
        self.peripherals
            .iter()
            .find(|p| p.contains(addr))
            .ok_or(SimulationError::Unmapped(addr))
    }

    fn entry_mut(&mut self, addr: u64) -> SimResult<&mut PeripheralEntry> {
        self.peripherals
            .iter_mut()
            .find(|p| p.contains(addr))
            .ok_or(SimulationError::Unmapped(addr))
    }

    /// First device of type `T`, with its base address.
    pub fn find<T: 'static>(&self) -> Option<(u64, &T)> {
        self.peripherals.iter().find_map(|p| {
            p.dev
                .as_any()
                .and_then(|any| any.downcast_ref::<T>())
                .map(|dev| (p.base, dev))
        })
    }

    pub fn find_mut<T: 'static>(&mut self) -> Option<(u64, &mut T)> {
        self.peripherals.iter_mut().find_map(|p| {
            let base = p.base;
            p.dev
                .as_any_mut()
                .and_then(|any| any.downcast_mut::<T>())
                .map(|dev| (base, dev))
        })
    }

    pub fn peripheral<T: 'static>(&self, name: &str) -> Option<&T> {
        self.peripherals
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.dev.as_any())
            .and_then(|any| any.downcast_ref::<T>())
    }

    pub fn record_fault(&mut self, fault: SimulationError) {
        tracing::error!("Bus fault: {}", fault);
        self.faults.push(fault);
    }

    pub fn faults(&self) -> &[SimulationError] {
        &self.faults
    }

    pub fn take_faults(&mut self) -> Vec<SimulationError> {
        std::mem::take(&mut self.faults)
    }
}

impl Bus for SystemBus {
    fn read_u32(&self, addr: u64) -> SimResult<u32> {
        if addr % 4 != 0 {
            return Err(SimulationError::Misaligned(addr));
        }
        let entry = self.entry(addr)?;
        let value = entry.dev.read(addr - entry.base)?;
        for observer in &self.observers {
            observer.on_read(addr, value);
        }
        Ok(value)
    }

    fn write_u32(&mut self, addr: u64, value: u32) -> SimResult<()> {
        if addr % 4 != 0 {
            return Err(SimulationError::Misaligned(addr));
        }
        let entry = self.entry_mut(addr)?;
        let offset = addr - entry.base;
        entry.dev.write(offset, value).map_err(|e| match e {
            SimulationError::ReadOnly(_) => SimulationError::ReadOnly(addr),
            other => other,
        })?;
        for observer in &self.observers {
            observer.on_write(addr, value);
        }
        Ok(())
    }
}

/// A device's register block as seen through a shared [`SystemBus`].
///
/// This is what lets the firmware's port and UART types run unchanged on
/// the host. Faults cannot be returned through [`RegisterBlock`], so they
/// are recorded on the bus (reads yield 0, writes are dropped).
#[derive(Clone)]
pub struct BusWindow {
    bus: Rc<RefCell<SystemBus>>,
    base: u64,
}

impl BusWindow {
    pub fn new(bus: Rc<RefCell<SystemBus>>, base: u64) -> Self {
        Self { bus, base }
    }

    fn addr(&self, word: usize) -> u64 {
        self.base + (word as u64) * 4
    }
}

impl std::fmt::Debug for BusWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusWindow")
            .field("base", &format_args!("{:#x}", self.base))
            .finish()
    }
}

impl RegisterBlock for BusWindow {
    fn read(&self, word: usize) -> u32 {
        let addr = self.addr(word);
        let mut bus = self.bus.borrow_mut();
        match bus.read_u32(addr) {
            Ok(value) => value,
            Err(e) => {
                bus.record_fault(e);
                0
            }
        }
    }

    fn write(&mut self, word: usize, value: u32) {
        let addr = self.addr(word);
        let mut bus = self.bus.borrow_mut();
        if let Err(e) = bus.write_u32(addr, value) {
            bus.record_fault(e);
        }
    }
}
