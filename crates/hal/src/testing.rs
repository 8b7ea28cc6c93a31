use crate::RegisterBlock;
use std::cell::RefCell;
use std::rc::Rc;

/// Plain storage standing in for a device, shared with the test so it can
/// play the part of the external hardware.
#[derive(Debug, Clone)]
pub struct FakeRegs {
    inner: Rc<RefCell<FakeState>>,
}

#[derive(Debug)]
struct FakeState {
    words: Vec<u32>,
    reads: usize,
    writes: Vec<(usize, u32)>,
}

impl FakeRegs {
    pub fn new(len: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FakeState {
                words: vec![0; len],
                reads: 0,
                writes: Vec::new(),
            })),
        }
    }

    pub fn set(&self, word: usize, value: u32) {
        self.inner.borrow_mut().words[word] = value;
    }

    pub fn get(&self, word: usize) -> u32 {
        self.inner.borrow().words[word]
    }

    pub fn reads(&self) -> usize {
        self.inner.borrow().reads
    }

    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.inner.borrow().writes.clone()
    }
}

impl RegisterBlock for FakeRegs {
    fn read(&self, word: usize) -> u32 {
        let mut state = self.inner.borrow_mut();
        state.reads += 1;
        state.words[word]
    }

    fn write(&mut self, word: usize, value: u32) {
        let mut state = self.inner.borrow_mut();
        state.words[word] = value;
        state.writes.push((word, value));
    }
}
