#![no_main]
#![no_std]

use cortex_m_rt::entry;
use panic_halt as _;
use switchport_hal::{
    Controller, InputPort, Mmio, OutputPort, Uart, IPORT_BASE, OPORT_BASE, UART_BASE,
};

#[entry]
fn main() -> ! {
    // SAFETY: these are the SoC's device blocks and each is claimed once.
    let (switches, leds, serial) = unsafe {
        (
            Mmio::new(IPORT_BASE),
            Mmio::new(OPORT_BASE),
            Mmio::new(UART_BASE),
        )
    };

    // Held for the life of the program; the control loop never transmits.
    let _uart = Uart::new(serial);

    Controller::new(InputPort::new(switches), OutputPort::new(leds)).run()
}
