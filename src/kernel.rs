//! # Kernel
//!
//! System lifecycle state and coarse resource accounting for Minux.
//!
//! The kernel does not know about the scheduler. It is constructed once in
//! the firmware entry point, borrowed by the scheduler for each tick and
//! handed to every task through its [`TaskContext`](crate::task::TaskContext).
//! All query methods take `&self`, so tasks can read uptime and memory or
//! trigger a panic while the scheduler is mid-dispatch.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► CortexM4::init()        ← Start the millisecond clock
//!         ├─► Kernel::init()          ← Boot time, state = Running
//!         ├─► Scheduler::register()   ← Register tasks (×N)
//!         └─► loop { tick(); wfi }    ← Cooperative dispatch (no return)
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//!   Boot ──► Running ──► Sleep
//!               │  ▲       │
//!               │  └───────┘
//!               ├──────► Error     (terminal, via panic)
//!               └──────► Shutdown  (terminal)
//! ```

use core::cell::Cell;
use core::fmt;

use crate::arch::Platform;
use crate::config::KERNEL_VERSION;

// ---------------------------------------------------------------------------
// System state
// ---------------------------------------------------------------------------

/// Coarse lifecycle state of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    Boot,
    Running,
    Sleep,
    Error,
    Shutdown,
}

impl SystemState {
    /// Whether no transition may leave this state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Error | Self::Shutdown)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Boot => "BOOT",
            Self::Running => "RUNNING",
            Self::Sleep => "SLEEP",
            Self::Error => "ERROR",
            Self::Shutdown => "SHUTDOWN",
        }
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Error returned by [`Kernel::set_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// The kernel is in `Error` or `Shutdown`, which cannot be left.
    TerminalState(SystemState),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TerminalState(state) => write!(f, "cannot leave terminal state {}", state),
        }
    }
}

// ---------------------------------------------------------------------------
// Memory accounting
// ---------------------------------------------------------------------------

/// Memory snapshot. Invariants: `used + free == total` and
/// `fragmentation == used * 100 / total`.
///
/// `used` is an estimate: the distance between the current stack pointer
/// and the heap high-water mark, clamped to `total`. It is not an
/// allocator statistic and moves with stack depth at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemInfo {
    pub total: u32,
    pub used: u32,
    pub free: u32,
    /// Percentage of `total` in use, floor-rounded.
    pub fragmentation: u8,
}

impl MemInfo {
    /// Build a snapshot from a probe of the stack pointer and heap top.
    pub fn from_probe(total: u32, stack_pointer: usize, heap_top: usize) -> Self {
        let gap = stack_pointer.saturating_sub(heap_top);
        let used = u32::try_from(gap).unwrap_or(u32::MAX).min(total);
        let fragmentation = if total == 0 {
            0
        } else {
            // `used <= total`, so the ratio is at most 100
            (u64::from(used) * 100 / u64::from(total)) as u8
        };
        Self {
            total,
            used,
            free: total - used,
            fragmentation,
        }
    }
}

impl fmt::Display for MemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total {} B, used {} B, free {} B, usage {}%",
            self.total, self.used, self.free, self.fragmentation
        )
    }
}

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

/// Lifecycle state, uptime and memory accounting.
pub struct Kernel<'p> {
    platform: &'p dyn Platform,
    state: Cell<SystemState>,
    boot_time: Cell<u64>,
    memory: Cell<MemInfo>,
}

impl<'p> Kernel<'p> {
    /// Create a kernel in the `Boot` state. Nothing is read from the
    /// platform until [`init`](Self::init).
    pub fn new(platform: &'p dyn Platform) -> Self {
        Self {
            platform,
            state: Cell::new(SystemState::Boot),
            boot_time: Cell::new(0),
            memory: Cell::new(MemInfo::default()),
        }
    }

    /// Record the boot timestamp, enter `Running` and take the first memory
    /// snapshot.
    ///
    /// Must be called exactly once: a second call resets the boot time.
    pub fn init(&mut self) {
        self.boot_time.set(self.platform.now_ms());
        self.state.set(SystemState::Running);
        let mem = self.memory_info();
        log::info!("Minux kernel {} up, {}", KERNEL_VERSION, mem);
    }

    /// Current platform time in milliseconds.
    #[inline]
    pub fn now(&self) -> u64 {
        self.platform.now_ms()
    }

    /// Milliseconds since [`init`](Self::init).
    pub fn uptime(&self) -> u64 {
        self.now().saturating_sub(self.boot_time.get())
    }

    /// Whole seconds since [`init`](Self::init).
    pub fn uptime_secs(&self) -> u64 {
        self.uptime() / 1000
    }

    /// Probe the platform and return a fresh memory snapshot.
    pub fn memory_info(&self) -> MemInfo {
        let mem = MemInfo::from_probe(
            self.platform.total_memory(),
            self.platform.stack_pointer(),
            self.platform.heap_top(),
        );
        self.memory.set(mem);
        mem
    }

    /// The snapshot taken by the last [`memory_info`](Self::memory_info).
    pub fn last_memory_info(&self) -> MemInfo {
        self.memory.get()
    }

    pub fn state(&self) -> SystemState {
        self.state.get()
    }

    /// Switch to `state`. Any transition is accepted except leaving
    /// `Error` or `Shutdown`; callers are responsible for only requesting
    /// meaningful ones.
    pub fn set_state(&self, state: SystemState) -> Result<(), KernelError> {
        let current = self.state.get();
        if current.is_terminal() && current != state {
            log::warn!("Refusing state change {} -> {}", current, state);
            return Err(KernelError::TerminalState(current));
        }
        log::debug!("System state {} -> {}", current, state);
        self.state.set(state);
        Ok(())
    }

    pub fn version(&self) -> &'static str {
        KERNEL_VERSION
    }

    /// Fail-stop. Enters `Error`, reports `message` on the log and parks
    /// the device. **Does not return**; only a hardware reset recovers.
    pub fn panic(&self, message: &str) -> ! {
        self.state.set(SystemState::Error);
        log::error!("KERNEL PANIC: {}", message);
        self.platform.halt()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
