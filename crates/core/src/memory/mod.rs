use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start_addr: u64,
    pub data: Vec<u8>,
}

impl Segment {
    pub fn end_addr(&self) -> u64 {
        self.start_addr + self.data.len() as u64
    }
}

/// A firmware image as a list of loadable segments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramImage {
    pub entry_point: u64,
    pub segments: Vec<Segment>,
}

impl ProgramImage {
    pub fn new(entry_point: u64) -> Self {
        Self {
            entry_point,
            segments: Vec::new(),
        }
    }

    pub fn add_segment(&mut self, start_addr: u64, data: Vec<u8>) {
        self.segments.push(Segment { start_addr, data });
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.data.is_empty())
    }

    /// Flattened address -> byte view. Later segments win where they overlap.
    pub fn byte_map(&self) -> BTreeMap<u64, u8> {
        let mut map = BTreeMap::new();
        for segment in &self.segments {
            for (i, &b) in segment.data.iter().enumerate() {
                map.insert(segment.start_addr + i as u64, b);
            }
        }
        map
    }

    pub fn highest_address(&self) -> Option<u64> {
        self.segments
            .iter()
            .filter(|s| !s.data.is_empty())
            .map(|s| s.end_addr() - 1)
            .max()
    }
}
