//! Host-side test double for [`Platform`].

use core::cell::Cell;

use super::Platform;

/// Manually driven clock and memory probe. `halt` unwinds with a Rust panic
/// so tests can observe the kernel state after a fail-stop.
pub struct MockPlatform {
    pub now: Cell<u64>,
    pub stack_pointer: Cell<usize>,
    pub heap_top: Cell<usize>,
    pub total: u32,
}

impl MockPlatform {
    pub const RAM_BASE: usize = 0x2000_0000;

    pub fn new() -> Self {
        Self {
            now: Cell::new(0),
            stack_pointer: Cell::new(Self::RAM_BASE + 0x3000),
            heap_top: Cell::new(Self::RAM_BASE + 0x1000),
            total: 16 * 1024,
        }
    }

    pub fn set_now(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Platform for MockPlatform {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn stack_pointer(&self) -> usize {
        self.stack_pointer.get()
    }

    fn heap_top(&self) -> usize {
        self.heap_top.get()
    }

    fn total_memory(&self) -> u32 {
        self.total
    }

    fn halt(&self) -> ! {
        panic!("platform halted");
    }
}
