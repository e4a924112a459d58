//! # Cortex-M4 Port Layer
//!
//! Hardware-specific code for the ARM Cortex-M4 (Thumb-2) processor:
//! the millisecond clock driven by SysTick, the memory probe used by the
//! kernel's accounting, the fail-stop halt loop and the ITM log sink.
//!
//! ## Clock
//!
//! SysTick fires at `TICK_HZ` and only bumps a 64-bit millisecond counter.
//! It never switches context: scheduling stays cooperative and happens
//! in the main loop. The counter is shared with thread mode through an
//! interrupt-safe `Mutex<Cell<u64>>` since a 64-bit read is not atomic on
//! this core.
//!
//! ## Memory Probe
//!
//! `cortex-m-rt` places the heap start (`__sheap`) right after `.bss` and
//! the main stack at the top of RAM, growing down. Nothing in the firmware
//! allocates, so the heap high-water mark is the heap start and the gap
//! between it and the current stack pointer is what the kernel reports.

use core::cell::{Cell, RefCell};
use core::fmt::Write as _;

use cortex_m::interrupt::Mutex;
use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{ITM, SCB, SYST};
use cortex_m_rt::exception;

use super::Platform;
use crate::config::{HALT_BLINK_MS, SYSTEM_CLOCK_HZ, TICK_HZ, TOTAL_MEMORY};
use crate::sync;

extern "C" {
    /// Start of the heap, provided by `cortex-m-rt`'s `link.x`.
    static __sheap: u8;
}

/// Milliseconds since SysTick was started.
static MILLIS: Mutex<Cell<u64>> = Mutex::new(Cell::new(0));

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure the SysTick timer for the millisecond clock.
///
/// Sets up SysTick to fire at `TICK_HZ` frequency using the processor
/// clock.
pub fn configure_systick(syst: &mut SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Put SysTick at the lowest exception priority so it never delays a
/// peripheral interrupt.
pub fn set_interrupt_priorities(scb: &mut SCB) {
    // SAFETY: changing SysTick's priority cannot break a priority-based
    // critical section; the only shared state it touches is `MILLIS`,
    // which is accessed with interrupts disabled.
    unsafe {
        scb.set_priority(SystemHandler::SysTick, 0xF0);
    }
}

#[exception]
fn SysTick() {
    sync::critical_section(|cs| {
        let millis = MILLIS.borrow(cs);
        millis.set(millis.get() + 1);
    });
}

// ---------------------------------------------------------------------------
// Platform implementation
// ---------------------------------------------------------------------------

/// The Cortex-M4 board. Zero-sized: all state lives in the peripherals and
/// in `MILLIS`.
pub struct CortexM4 {
    _private: (),
}

impl CortexM4 {
    /// Start the millisecond clock and return the board handle.
    pub fn init(syst: &mut SYST, scb: &mut SCB) -> Self {
        set_interrupt_priorities(scb);
        configure_systick(syst);
        Self { _private: () }
    }
}

impl Platform for CortexM4 {
    fn now_ms(&self) -> u64 {
        sync::critical_section(|cs| MILLIS.borrow(cs).get())
    }

    fn stack_pointer(&self) -> usize {
        cortex_m::register::msp::read() as usize
    }

    fn heap_top(&self) -> usize {
        // SAFETY: only the address of the linker symbol is taken.
        unsafe { core::ptr::addr_of!(__sheap) as usize }
    }

    fn total_memory(&self) -> u32 {
        TOTAL_MEMORY
    }

    fn halt(&self) -> ! {
        cortex_m::interrupt::disable();
        loop {
            cortex_m::asm::delay(SYSTEM_CLOCK_HZ / 1000 * HALT_BLINK_MS);
        }
    }
}

// ---------------------------------------------------------------------------
// ITM logger
// ---------------------------------------------------------------------------

/// ITM unit, owned by the logger once installed.
static ITM_PORT: Mutex<RefCell<Option<ITM>>> = Mutex::new(RefCell::new(None));

static LOGGER: ItmLogger = ItmLogger;

/// `log` sink writing one line per record to ITM stimulus port 0.
pub struct ItmLogger;

impl log::Log for ItmLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        sync::critical_section(|cs| {
            if let Some(itm) = ITM_PORT.borrow(cs).borrow_mut().as_mut() {
                let mut line: heapless::String<128> = heapless::String::new();
                // Overlong records are cut at the buffer size.
                let _ = write!(line, "[{:<5}] {}", record.level(), record.args());
                cortex_m::iprintln!(&mut itm.stim[0], "{}", line);
            }
        });
    }

    fn flush(&self) {}
}

/// Hand the ITM unit to the logger and install it as the global `log` sink.
/// A second call leaves the first logger in place.
pub fn install_logger(itm: ITM, level: log::LevelFilter) {
    sync::critical_section(|cs| {
        *ITM_PORT.borrow(cs).borrow_mut() = Some(itm);
    });
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
