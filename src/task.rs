//! # Process Control Block
//!
//! Defines the process model for Minux. Each registered task owns one slot
//! in the scheduler's fixed-size process table. A slot holds a PCB (name,
//! timing, state) and, separately, a borrowed reference to the task itself.
//!
//! ## Task Contract
//!
//! Tasks are run to completion inside [`Scheduler::tick`]. There is no
//! preemption and no yielding mid-run: a task that busy-waits starves every
//! other task for that long. Tasks must therefore do a bounded amount of
//! work per invocation and keep their progress in their own state.
//!
//! [`Scheduler::tick`]: crate::scheduler::Scheduler::tick

use core::fmt;

use crate::config::{DEFAULT_PRIORITY, MAX_NAME_LEN};
use crate::kernel::Kernel;

/// Bounded process name.
pub type ProcessName = heapless::String<MAX_NAME_LEN>;

// ---------------------------------------------------------------------------
// Process state machine
// ---------------------------------------------------------------------------

/// Execution state of a process.
///
/// ```text
///   ┌──────────┐        tick()       ┌─────────┐
///   │  Ready   │ ──────────────────► │ Running │
///   └──────────┘ ◄────────────────── └─────────┘
///     │      ▲      run completed
///     │      │
///  suspend  resume
///     ▼      │
///   ┌──────────┐       stop()        ┌────────────┐
///   │ Blocked  │ ──────────────────► │ Terminated │
///   └──────────┘                     └────────────┘
/// ```
///
/// `Ready` also goes straight to `Terminated` on `stop()`. `Running` is
/// only ever observed by the running task itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Waiting for its interval to elapse.
    Ready,
    /// Inside its own callback.
    Running,
    /// Suspended; skipped by the scheduler until resumed.
    Blocked,
    /// Stopped. The slot stays visible until it is reclaimed.
    Terminated,
}

impl ProcessState {
    /// Label printed by the shell's `ps`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Blocked => "BLOCKED",
            Self::Terminated => "TERMINATED",
        }
    }

    /// Three-letter label for the display's process monitor.
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Ready => "RDY",
            Self::Running => "RUN",
            Self::Blocked => "BLK",
            Self::Terminated => "END",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

// ---------------------------------------------------------------------------
// Process Control Block
// ---------------------------------------------------------------------------

/// Process Control Block (PCB): identity, timing and state of one slot.
#[derive(Debug, Clone)]
pub struct ProcessControlBlock {
    /// Identifier, unique among active processes.
    pub name: ProcessName,

    /// Milliseconds between invocations.
    pub interval: u32,

    /// Timestamp of the last invocation. `0` until the first run.
    pub last_run: u64,

    /// Whether the slot is part of the table. `false` implies `Terminated`.
    pub active: bool,

    /// Dispatch priority, higher runs first within a tick.
    pub priority: u8,

    /// Current execution state.
    pub state: ProcessState,

    /// Completed invocations since registration.
    pub run_count: u32,
}

impl ProcessControlBlock {
    /// An unallocated slot. Used to initialize the process table.
    pub const EMPTY: Self = Self {
        name: ProcessName::new(),
        interval: 0,
        last_run: 0,
        active: false,
        priority: DEFAULT_PRIORITY,
        state: ProcessState::Terminated,
        run_count: 0,
    };

    /// Reset the slot for a newly registered process.
    pub fn init(&mut self, name: ProcessName, interval: u32, priority: u8) {
        self.name = name;
        self.interval = interval;
        self.last_run = 0;
        self.active = true;
        self.priority = priority;
        self.state = ProcessState::Ready;
        self.run_count = 0;
    }

    /// Remove the process from scheduling. One-way.
    pub fn terminate(&mut self) {
        self.active = false;
        self.state = ProcessState::Terminated;
    }

    /// Check if this process may be dispatched (active and Ready).
    #[inline]
    pub fn is_runnable(&self) -> bool {
        self.active && self.state == ProcessState::Ready
    }

    /// Check if this process is runnable and its interval has elapsed at
    /// `now`. A clock that went backwards never makes a process due.
    #[inline]
    pub fn is_due(&self, now: u64) -> bool {
        self.is_runnable() && now.saturating_sub(self.last_run) >= u64::from(self.interval)
    }
}

/// Truncate `name` to [`MAX_NAME_LEN`] bytes without splitting a
/// character.
pub fn truncate_name(name: &str) -> ProcessName {
    let mut end = name.len().min(MAX_NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = ProcessName::new();
    // `end` never exceeds the capacity, the push cannot fail.
    let _ = out.push_str(&name[..end]);
    out
}

// ---------------------------------------------------------------------------
// Diagnostic snapshot
// ---------------------------------------------------------------------------

/// Owned copy of a PCB plus its slot index, for diagnostic listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub index: usize,
    pub name: ProcessName,
    pub interval: u32,
    pub last_run: u64,
    pub priority: u8,
    pub state: ProcessState,
    pub run_count: u32,
}

impl ProcessInfo {
    pub fn from_pcb(index: usize, pcb: &ProcessControlBlock) -> Self {
        Self {
            index,
            name: pcb.name.clone(),
            interval: pcb.interval,
            last_run: pcb.last_run,
            priority: pcb.priority,
            state: pcb.state,
            run_count: pcb.run_count,
        }
    }
}

impl fmt::Display for ProcessInfo {
    /// One `ps` row: `PID  NAME  STATE`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<4}{:<10}{}", self.index, self.name.as_str(), self.state)
    }
}

// ---------------------------------------------------------------------------
// Task abstraction
// ---------------------------------------------------------------------------

/// A periodic routine driven by the scheduler.
///
/// Implementations carry their own state (counters, collaborator
/// references). `run` must return after a bounded amount of work.
pub trait Task {
    fn run(&mut self, ctx: &TaskContext<'_>);
}

impl<F> Task for F
where
    F: FnMut(&TaskContext<'_>),
{
    fn run(&mut self, ctx: &TaskContext<'_>) {
        self(ctx);
    }
}

/// What a running task can see: the kernel, the process table (read-only)
/// and the timestamp of the current tick.
pub struct TaskContext<'a> {
    kernel: &'a Kernel<'a>,
    processes: ProcessTable<'a>,
    now: u64,
}

impl<'a> TaskContext<'a> {
    pub fn new(kernel: &'a Kernel<'a>, processes: ProcessTable<'a>, now: u64) -> Self {
        Self {
            kernel,
            processes,
            now,
        }
    }

    pub fn kernel(&self) -> &'a Kernel<'a> {
        self.kernel
    }

    pub fn processes(&self) -> ProcessTable<'a> {
        self.processes
    }

    /// Timestamp of the tick that dispatched this task.
    pub fn now(&self) -> u64 {
        self.now
    }
}

/// Read-only view over the allocated slots of the process table.
#[derive(Clone, Copy)]
pub struct ProcessTable<'a> {
    slots: &'a [ProcessControlBlock],
}

impl<'a> ProcessTable<'a> {
    pub fn new(slots: &'a [ProcessControlBlock]) -> Self {
        Self { slots }
    }

    /// Number of allocated slots, terminated ones included.
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, index: usize) -> Option<&'a ProcessControlBlock> {
        self.slots.get(index)
    }

    /// Active processes with their slot index, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a ProcessControlBlock)> + 'a {
        self.slots.iter().enumerate().filter(|(_, pcb)| pcb.active)
    }

    /// Slot of the first active process called exactly `name`. A name
    /// longer than [`MAX_NAME_LEN`] never matches.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.iter()
            .find(|(_, pcb)| pcb.name.as_str() == name)
            .map(|(index, _)| index)
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
