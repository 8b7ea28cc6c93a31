//! The busy-wait primitive. Every suspension point of the firmware goes
//! through here, there is no timeout and no yield to anything else.

/// Outcome of one step of a polled state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// An action was taken (a register was written or a wait finished).
    Advanced,
    /// The awaited hardware condition did not hold on this observation.
    Spinning,
}

impl Poll {
    pub fn is_spinning(self) -> bool {
        matches!(self, Poll::Spinning)
    }
}

/// Spin until `cond` returns true. Never returns if it never does.
#[inline]
pub fn spin_until(mut cond: impl FnMut() -> bool) {
    while !cond() {
        core::hint::spin_loop();
    }
}
