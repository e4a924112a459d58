//! # Minux Configuration
//!
//! Compile-time constants governing the scheduler, the kernel accounting and
//! the firmware's built-in tasks. All limits are fixed at compile time and
//! nothing is allocated dynamically.

/// Maximum number of process slots the scheduler can hold simultaneously.
/// Each slot costs one PCB plus one task reference, so this bounds the
/// static footprint of the process table.
pub const MAX_PROCESSES: usize = 8;

/// Size of a process name field in bytes, terminator slot included.
pub const MAX_PROCESS_NAME: usize = 8;

/// Visible bytes of a process name. Longer names are truncated at a
/// character boundary.
pub const MAX_NAME_LEN: usize = MAX_PROCESS_NAME - 1;

/// Priority assigned by [`Scheduler::register`](crate::scheduler::Scheduler::register).
pub const DEFAULT_PRIORITY: u8 = 1;

/// SysTick frequency in Hz. One tick is one millisecond of uptime.
pub const TICK_HZ: u32 = 1000;

/// System clock frequency in Hz (16 MHz HSI after reset).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Total SRAM in bytes. Must match the `RAM` length in `memory.x`.
pub const TOTAL_MEMORY: u32 = 16 * 1024;

/// Delay between heartbeats of the halt loop entered by a kernel panic.
pub const HALT_BLINK_MS: u32 = 500;

/// Kernel version reported by diagnostics.
pub const KERNEL_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Built-in task periods (milliseconds)
// ---------------------------------------------------------------------------

/// Display refresh period.
pub const UI_UPDATE_MS: u32 = 100;

/// Button polling period (also the debounce window).
pub const INPUT_POLL_MS: u32 = 50;

/// Filesystem housekeeping period.
pub const FS_MAINTENANCE_MS: u32 = 1000;

/// Shell input processing period.
pub const SHELL_POLL_MS: u32 = 10;

/// Period of the system status report written to the log.
pub const STATUS_REPORT_MS: u32 = 5000;
