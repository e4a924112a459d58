//! # Architecture Abstraction Layer
//!
//! The hardware boundary of the kernel. A board port implements
//! [`Platform`]; the kernel only ever talks to the hardware through it.
//! Currently implements the Cortex-M4 port; extensible to other
//! architectures by adding sibling modules.

#[cfg(target_arch = "arm")]
pub mod cortex_m4;

#[cfg(test)]
pub mod mock;

/// Services a board must provide to the kernel.
pub trait Platform {
    /// Milliseconds since reset. Monotonic; assumed not to wrap within a
    /// session.
    fn now_ms(&self) -> u64;

    /// Current stack pointer.
    fn stack_pointer(&self) -> usize;

    /// Highest address ever handed out by the heap (the heap start when
    /// nothing was allocated).
    fn heap_top(&self) -> usize;

    /// Total SRAM in bytes.
    fn total_memory(&self) -> u32;

    /// Park the device forever. Only a hardware reset gets out of here.
    fn halt(&self) -> !;
}
