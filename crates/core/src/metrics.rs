use crate::BusObserver;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct AccessMetrics {
    reads: AtomicU64,
    writes: AtomicU64,
    polls: AtomicU64,
    spins: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSummary {
    pub bus_reads: u64,
    pub bus_writes: u64,
    pub polls: u64,
    pub spins: u64,
}

impl AccessMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn get_writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn get_polls(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }

    /// Polls that found the awaited condition false.
    pub fn get_spins(&self) -> u64 {
        self.spins.load(Ordering::SeqCst)
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            bus_reads: self.get_reads(),
            bus_writes: self.get_writes(),
            polls: self.get_polls(),
            spins: self.get_spins(),
        }
    }
}

impl BusObserver for AccessMetrics {
    fn on_read(&self, _addr: u64, _value: u32) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn on_write(&self, _addr: u64, _value: u32) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_poll(&self, spinning: bool) {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if spinning {
            self.spins.fetch_add(1, Ordering::SeqCst);
        }
    }
}
