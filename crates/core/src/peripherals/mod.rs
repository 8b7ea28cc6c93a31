pub mod output;
pub mod switches;
pub mod uart;

pub use output::OutputRegister;
pub use switches::SwitchBank;
pub use uart::Uart;
