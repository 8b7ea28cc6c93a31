//! The switch-driven control loop.
//!
//! Startup runs a short handshake with the operator (beacon, clear all
//! switches, raise switch 0), after which every change of the switch bank
//! is answered on the output port: `n!` for `n` in `0..=7`, or
//! [`ERROR_FLAG`] for anything larger.

use crate::{factorial, InputPort, OutputPort, Poll, RegisterBlock};

/// Startup pattern written before anything else.
pub const BEACON: u32 = 0x5555_5555;

/// Written when the switches hold a value without a factorial answer.
/// This is -1 as a 32-bit two's-complement word.
pub const ERROR_FLAG: u32 = -1i32 as u32;

/// Largest switch value that is answered with a factorial.
pub const MAX_FACTORIAL_INPUT: u32 = 7;

/// Switch value the main loop treats as already seen before its first
/// answer.
pub const NO_SWITCHES_SEEN: u32 = -1i32 as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    InitSignal,
    WaitForClear,
    ShiftUp,
    WaitForBit0,
    ShiftDown,
    /// Terminal phase; `last` is the previously answered switch value,
    /// `None` until the first answer.
    Watch { last: Option<u32> },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::InitSignal => "init_signal",
            Phase::WaitForClear => "wait_for_clear",
            Phase::ShiftUp => "shift_up",
            Phase::WaitForBit0 => "wait_for_bit0",
            Phase::ShiftDown => "shift_down",
            Phase::Watch { .. } => "watch",
        }
    }
}

/// Output value for a switch reading in the main loop.
pub fn respond(switches: u32) -> u32 {
    if switches <= MAX_FACTORIAL_INPUT {
        factorial(switches)
    } else {
        ERROR_FLAG
    }
}

#[derive(Debug)]
pub struct Controller<I, O> {
    input: InputPort<I>,
    output: OutputPort<O>,
    phase: Phase,
}

impl<I: RegisterBlock, O: RegisterBlock> Controller<I, O> {
    pub fn new(input: InputPort<I>, output: OutputPort<O>) -> Self {
        Self {
            input,
            output,
            phase: Phase::InitSignal,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Runs one action of the current phase, or one observation if the
    /// phase is a wait.
    pub fn poll(&mut self) -> Poll {
        match self.phase {
            Phase::InitSignal => {
                self.output.write_out(BEACON);
                self.phase = Phase::WaitForClear;
            }
            Phase::WaitForClear => {
                if self.input.read_switches() != 0 {
                    return Poll::Spinning;
                }
                self.phase = Phase::ShiftUp;
            }
            Phase::ShiftUp => {
                let value = self.output.read_out();
                self.output.write_out(value << 1);
                self.phase = Phase::WaitForBit0;
            }
            Phase::WaitForBit0 => {
                if self.input.read_switches() & 0x1 != 0x1 {
                    return Poll::Spinning;
                }
                self.phase = Phase::ShiftDown;
            }
            Phase::ShiftDown => {
                let value = self.output.read_out();
                self.output.write_out(value >> 1);
                self.phase = Phase::Watch { last: None };
            }
            Phase::Watch { last } => {
                let switches = self.input.read_switches();
                if switches == last.unwrap_or(NO_SWITCHES_SEEN) {
                    return Poll::Spinning;
                }
                self.output.write_out(respond(switches));
                self.phase = Phase::Watch {
                    last: Some(switches),
                };
            }
        }
        Poll::Advanced
    }

    /// Runs the loop forever.
    pub fn run(mut self) -> ! {
        loop {
            if self.poll().is_spinning() {
                core::hint::spin_loop();
            }
        }
    }

    pub fn free(self) -> (InputPort<I>, OutputPort<O>) {
        (self.input, self.output)
    }
}
