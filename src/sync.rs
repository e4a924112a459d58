//! # Synchronization Primitives
//!
//! Interrupt-safe critical section abstraction for the Cortex-M4.
//! The process table never needs one: it is only touched from the main
//! loop. The exception is state shared with interrupt handlers, such as
//! the SysTick millisecond counter and the ITM log sink.

use cortex_m::interrupt;

/// Execute a closure within a critical section (interrupts disabled).
///
/// Interrupts are disabled on entry and restored on exit, ensuring
/// atomicity of the enclosed operation.
///
/// # Usage
/// ```ignore
/// sync::critical_section(|cs| MILLIS.borrow(cs).get());
/// ```
///
/// Keep critical sections short: SysTick is delayed for their duration.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&interrupt::CriticalSection) -> R,
{
    interrupt::free(f)
}
