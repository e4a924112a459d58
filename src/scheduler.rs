//! # Scheduler
//!
//! Cooperative, fixed-capacity round-robin scheduler for Minux.
//!
//! ## Dispatch Algorithm
//!
//! The firmware main loop calls [`Scheduler::tick`] once per iteration:
//! 1. **Read the clock** once; every task dispatched in this tick sees the
//!    same `now`
//! 2. **Scan** the active processes in dispatch order
//! 3. **Run** each Ready process whose interval has elapsed since its last
//!    run, to completion, then stamp `last_run = now`
//!
//! A process runs at most once per tick. Missed intervals are dropped, not
//! replayed: a process that was not ticked for ten intervals runs once.
//!
//! ## Dispatch Order
//!
//! Registration order, with higher `priority` first. Processes of equal
//! priority keep the order they were registered in.
//!
//! ## Process Table
//!
//! A fixed arena of `N` slots handed out in index order. A stopped process
//! keeps its slot (visible as `Terminated`). Under the default
//! [`SlotPolicy::Append`] a slot is never reused, so at most `N`
//! registrations succeed per boot. [`SlotPolicy::Reclaim`] opts into reusing
//! terminated slots from a free list once the arena is exhausted.

use core::fmt;

use heapless::Vec;

use crate::config::{DEFAULT_PRIORITY, MAX_PROCESSES};
use crate::kernel::Kernel;
use crate::task::{
    truncate_name, ProcessControlBlock, ProcessInfo, ProcessState, ProcessTable, Task, TaskContext,
};

// ---------------------------------------------------------------------------
// Errors and policy
// ---------------------------------------------------------------------------

/// Error returned by [`Scheduler::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// No free slot in the process table.
    ResourceExhausted,
    /// An active process already uses this (truncated) name.
    DuplicateName,
}

impl SchedulerError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResourceExhausted => "process table full",
            Self::DuplicateName => "process name already in use",
        }
    }
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to the slot of a stopped process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPolicy {
    /// Never reuse a slot: `N` registrations per boot, stopped or not.
    Append,
    /// Reuse terminated slots once every slot has been handed out.
    Reclaim,
}

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The process table and its dispatcher.
///
/// Tasks are borrowed for `'a`: the registering collaborator keeps
/// ownership, the scheduler only holds the reference. They are stored
/// apart from the PCBs so a running task can be handed a read-only view of
/// the whole table.
pub struct Scheduler<'a, const N: usize = MAX_PROCESSES> {
    /// PCB per slot. Slots `len..N` have never been handed out.
    pcbs: [ProcessControlBlock; N],

    /// Task per slot, `None` for free and terminated slots.
    tasks: [Option<&'a mut dyn Task>; N],

    /// Number of slots handed out so far.
    len: usize,

    /// Active slots in dispatch order.
    order: Vec<usize, N>,

    /// Terminated slots available for reuse, most recently freed last.
    free: Vec<usize, N>,

    policy: SlotPolicy,

    /// Number of `tick` calls.
    tick_count: u64,

    /// Number of `tick` calls that ran nothing.
    idle_ticks: u64,
}

impl<'a, const N: usize> Scheduler<'a, N> {
    /// Create an empty scheduler that never reuses a slot.
    pub fn new() -> Self {
        Self::with_policy(SlotPolicy::Append)
    }

    pub fn with_policy(policy: SlotPolicy) -> Self {
        Self {
            pcbs: [ProcessControlBlock::EMPTY; N],
            tasks: core::array::from_fn(|_| None),
            len: 0,
            order: Vec::new(),
            free: Vec::new(),
            policy,
            tick_count: 0,
            idle_ticks: 0,
        }
    }

    pub fn policy(&self) -> SlotPolicy {
        self.policy
    }

    /// Register `task` to run every `interval` ms at the default priority.
    ///
    /// See [`register_with_priority`](Self::register_with_priority).
    pub fn register(
        &mut self,
        name: &str,
        task: &'a mut dyn Task,
        interval: u32,
    ) -> Result<usize, SchedulerError> {
        self.register_with_priority(name, task, interval, DEFAULT_PRIORITY)
    }

    /// Register `task` under `name` (truncated to `MAX_NAME_LEN`).
    ///
    /// The new process is Ready with `last_run = 0`, so it first runs on
    /// the first tick at or after `interval` ms.
    ///
    /// # Returns
    /// - `Ok(slot)`: the slot index of the new process
    /// - `Err(ResourceExhausted)`: all `N` slots were handed out (and, under
    ///   [`SlotPolicy::Reclaim`], none is terminated); the table is unchanged
    /// - `Err(DuplicateName)`: an active process already has this name
    pub fn register_with_priority(
        &mut self,
        name: &str,
        task: &'a mut dyn Task,
        interval: u32,
        priority: u8,
    ) -> Result<usize, SchedulerError> {
        let name = truncate_name(name);
        if self.table().find(&name).is_some() {
            log::warn!("Process '{}' is already running", name.as_str());
            return Err(SchedulerError::DuplicateName);
        }

        let Some(slot) = self.allocate_slot() else {
            log::warn!("Process table full, cannot start '{}'", name.as_str());
            return Err(SchedulerError::ResourceExhausted);
        };

        log::debug!(
            "Started '{}' in slot {} (every {} ms, priority {})",
            name.as_str(),
            slot,
            interval,
            priority
        );
        self.pcbs[slot].init(name, interval, priority);
        self.tasks[slot] = Some(task);

        // After every process of greater or equal priority
        let pos = self
            .order
            .iter()
            .position(|&other| self.pcbs[other].priority < priority)
            .unwrap_or(self.order.len());
        // `order` only holds active slots and `slot` was free, so there is room.
        let _ = self.order.insert(pos, slot);

        Ok(slot)
    }

    /// Hand out the next fresh slot, or a terminated one under
    /// [`SlotPolicy::Reclaim`] once the arena is exhausted.
    fn allocate_slot(&mut self) -> Option<usize> {
        if self.len < N {
            self.len += 1;
            return Some(self.len - 1);
        }
        match self.policy {
            SlotPolicy::Append => None,
            SlotPolicy::Reclaim => {
                let slot = self.free.pop()?;
                log::debug!("Reclaiming slot {} from '{}'", slot, self.pcbs[slot].name.as_str());
                Some(slot)
            }
        }
    }

    /// Stop the first active process called `name`. It will not be
    /// dispatched again; a call in progress is not interrupted.
    ///
    /// Returns `false` (and changes nothing) if no such process exists.
    pub fn stop(&mut self, name: &str) -> bool {
        let Some(slot) = self.find(name) else {
            return false;
        };

        self.pcbs[slot].terminate();
        self.tasks[slot] = None;
        self.order.retain(|&other| other != slot);
        if self.policy == SlotPolicy::Reclaim {
            // At most N slots can ever be terminated at once.
            let _ = self.free.push(slot);
        }

        log::debug!("Stopped '{}' (slot {})", self.pcbs[slot].name.as_str(), slot);
        true
    }

    /// Block a Ready process. Blocked processes are skipped by `tick` and
    /// their `last_run` is left untouched.
    ///
    /// Returns `false` if the process is absent or not Ready.
    pub fn suspend(&mut self, name: &str) -> bool {
        self.transition(name, ProcessState::Ready, ProcessState::Blocked)
    }

    /// Make a Blocked process Ready again. If its interval elapsed while it
    /// was blocked, it runs on the next tick.
    ///
    /// Returns `false` if the process is absent or not Blocked.
    pub fn resume(&mut self, name: &str) -> bool {
        self.transition(name, ProcessState::Blocked, ProcessState::Ready)
    }

    fn transition(&mut self, name: &str, from: ProcessState, to: ProcessState) -> bool {
        let Some(slot) = self.find(name) else {
            return false;
        };
        let pcb = &mut self.pcbs[slot];
        if pcb.state != from {
            return false;
        }
        pcb.state = to;
        log::debug!("'{}' {} -> {}", pcb.name.as_str(), from, to);
        true
    }

    /// Dispatch every due process once, using the kernel clock.
    ///
    /// # Returns
    /// The number of processes that ran. Zero means the tick was idle and
    /// the caller may sleep until the next clock interrupt.
    pub fn tick(&mut self, kernel: &Kernel<'_>) -> usize {
        let now = kernel.now();
        self.tick_at(kernel, now)
    }

    /// Dispatch every process due at `now` once, in dispatch order.
    pub fn tick_at(&mut self, kernel: &Kernel<'_>, now: u64) -> usize {
        self.tick_count += 1;
        let mut ran = 0;

        for i in 0..self.order.len() {
            let slot = self.order[i];
            if !self.pcbs[slot].is_due(now) {
                continue;
            }

            self.pcbs[slot].state = ProcessState::Running;
            if let Some(task) = self.tasks[slot].as_deref_mut() {
                let ctx = TaskContext::new(kernel, ProcessTable::new(&self.pcbs[..self.len]), now);
                task.run(&ctx);
            }

            let pcb = &mut self.pcbs[slot];
            pcb.last_run = now;
            pcb.run_count = pcb.run_count.wrapping_add(1);
            pcb.state = ProcessState::Ready;
            ran += 1;
            log::trace!("Ran '{}' at {} ms", pcb.name.as_str(), now);
        }

        if ran == 0 {
            self.idle_ticks += 1;
        }
        ran
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Number of slots handed out, terminated processes included. Valid
    /// indices for [`process`](Self::process) are `0..process_count()`.
    pub fn process_count(&self) -> usize {
        self.len
    }

    /// Number of active processes.
    pub fn active_count(&self) -> usize {
        self.order.len()
    }

    pub fn process(&self, index: usize) -> Option<&ProcessControlBlock> {
        self.table().get(index)
    }

    /// Slot of the active process called `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.table().find(name)
    }

    /// Snapshot of every active process, in slot order.
    pub fn processes(&self) -> Vec<ProcessInfo, N> {
        let mut list = Vec::new();
        for (index, pcb) in self.table().iter() {
            // At most N active processes
            let _ = list.push(ProcessInfo::from_pcb(index, pcb));
        }
        list
    }

    /// Read-only view of the allocated slots.
    pub fn table(&self) -> ProcessTable<'_> {
        ProcessTable::new(&self.pcbs[..self.len])
    }

    /// Number of `tick` calls so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of `tick` calls that found no process due.
    pub fn idle_ticks(&self) -> u64 {
        self.idle_ticks
    }
}

impl<const N: usize> Default for Scheduler<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::mock::MockPlatform;
    use crate::kernel::SystemState;
    use std::cell::{Cell, RefCell};

    /// Counts its invocations.
    struct Counter<'c> {
        runs: &'c Cell<u32>,
    }

    impl Task for Counter<'_> {
        fn run(&mut self, _ctx: &TaskContext<'_>) {
            self.runs.set(self.runs.get() + 1);
        }
    }

    /// Appends its name to a shared log on every run.
    struct Recorder<'c> {
        name: &'static str,
        calls: &'c RefCell<String>,
    }

    impl Task for Recorder<'_> {
        fn run(&mut self, _ctx: &TaskContext<'_>) {
            self.calls.borrow_mut().push_str(self.name);
        }
    }

    fn booted_kernel(platform: &MockPlatform) -> Kernel<'_> {
        let mut kernel = Kernel::new(platform);
        kernel.init();
        kernel
    }

    fn noop(_: &TaskContext<'_>) {}

    #[test]
    fn test_capacity() {
        let mut tasks = [noop; MAX_PROCESSES + 1];
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        let (last, rest) = tasks.split_last_mut().unwrap();

        for (i, task) in rest.iter_mut().enumerate() {
            let name = ["p0", "p1", "p2", "p3", "p4", "p5", "p6", "p7"][i];
            assert_eq!(scheduler.register(name, task, 10), Ok(i));
        }
        assert_eq!(scheduler.process_count(), MAX_PROCESSES);

        assert_eq!(
            scheduler.register("extra", last, 10),
            Err(SchedulerError::ResourceExhausted)
        );
        assert_eq!(scheduler.process_count(), MAX_PROCESSES);
        assert_eq!(scheduler.active_count(), MAX_PROCESSES);
        assert!(scheduler.find("extra").is_none());
    }

    #[test]
    fn test_default_policy_rejects_registration_after_stop_when_full() {
        let mut tasks = [noop; MAX_PROCESSES + 1];
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        assert_eq!(scheduler.policy(), SlotPolicy::Append);
        let (last, rest) = tasks.split_last_mut().unwrap();

        for (i, task) in rest.iter_mut().enumerate() {
            let name = ["p0", "p1", "p2", "p3", "p4", "p5", "p6", "p7"][i];
            scheduler.register(name, task, 10).unwrap();
        }
        assert!(scheduler.stop("p0"));

        assert_eq!(
            scheduler.register("extra", last, 10),
            Err(SchedulerError::ResourceExhausted)
        );
        assert_eq!(scheduler.process(0).unwrap().state, ProcessState::Terminated);
        assert_eq!(scheduler.active_count(), MAX_PROCESSES - 1);
    }

    #[test]
    fn test_new_process_state() {
        let mut task = noop;
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        let slot = scheduler.register_with_priority("ui", &mut task, 100, 3).unwrap();

        let pcb = scheduler.process(slot).unwrap();
        assert_eq!(pcb.name.as_str(), "ui");
        assert_eq!(pcb.state, ProcessState::Ready);
        assert_eq!(pcb.last_run, 0);
        assert_eq!(pcb.interval, 100);
        assert_eq!(pcb.priority, 3);
        assert!(pcb.active);
    }

    #[test]
    fn test_long_name_is_truncated() {
        let mut task = noop;
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        let slot = scheduler.register("filesystem", &mut task, 1000).unwrap();

        assert_eq!(scheduler.process(slot).unwrap().name.as_str(), "filesys");
        assert_eq!(scheduler.find("filesys"), Some(slot));
        assert_eq!(scheduler.find("filesystem"), None);
    }

    #[test]
    fn test_longer_name_does_not_match_truncated_process() {
        let mut task = noop;
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("filesystem", &mut task, 1000).unwrap();

        assert!(!scheduler.stop("filesystem-backup"));
        assert!(!scheduler.suspend("filesystem"));
        assert_eq!(scheduler.process(0).unwrap().state, ProcessState::Ready);
        assert!(scheduler.stop("filesys"));
    }

    #[test]
    fn test_duplicate_active_name_rejected() {
        let (mut a, mut b) = (noop, noop);
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("shell", &mut a, 10).unwrap();

        assert_eq!(
            scheduler.register("shell", &mut b, 10),
            Err(SchedulerError::DuplicateName)
        );
        assert_eq!(scheduler.process_count(), 1);
    }

    #[test]
    fn test_due_at_interval() {
        let platform = MockPlatform::new();
        let kernel = booted_kernel(&platform);
        let runs = Cell::new(0);
        let mut task = Counter { runs: &runs };
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("input", &mut task, 50).unwrap();

        for t in 0..50 {
            assert_eq!(scheduler.tick_at(&kernel, t), 0);
        }
        assert_eq!(runs.get(), 0);

        assert_eq!(scheduler.tick_at(&kernel, 50), 1);
        assert_eq!(runs.get(), 1);

        assert_eq!(scheduler.tick_at(&kernel, 50), 0);
        assert_eq!(runs.get(), 1);

        let pcb = scheduler.process(0).unwrap();
        assert_eq!(pcb.last_run, 50);
        assert_eq!(pcb.run_count, 1);
        assert_eq!(pcb.state, ProcessState::Ready);
    }

    #[test]
    fn test_no_backlog() {
        let platform = MockPlatform::new();
        let kernel = booted_kernel(&platform);
        let runs = Cell::new(0);
        let mut task = Counter { runs: &runs };
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("fs", &mut task, 10).unwrap();

        scheduler.tick_at(&kernel, 0);
        scheduler.tick_at(&kernel, 1000);
        assert_eq!(runs.get(), 1);

        // Next run is relative to the late one
        scheduler.tick_at(&kernel, 1009);
        assert_eq!(runs.get(), 1);
        scheduler.tick_at(&kernel, 1010);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_tick_uses_kernel_clock() {
        let platform = MockPlatform::new();
        let kernel = booted_kernel(&platform);
        let runs = Cell::new(0);
        let mut task = Counter { runs: &runs };
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("ui", &mut task, 100).unwrap();

        platform.set_now(99);
        scheduler.tick(&kernel);
        assert_eq!(runs.get(), 0);

        platform.set_now(100);
        scheduler.tick(&kernel);
        assert_eq!(runs.get(), 1);
        assert_eq!(scheduler.tick_count(), 2);
    }

    #[test]
    fn test_registration_order() {
        let platform = MockPlatform::new();
        let kernel = booted_kernel(&platform);
        let calls = RefCell::new(String::new());
        let mut a = Recorder { name: "a", calls: &calls };
        let mut b = Recorder { name: "b", calls: &calls };
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("a", &mut a, 5).unwrap();
        scheduler.register("b", &mut b, 5).unwrap();

        assert_eq!(scheduler.tick_at(&kernel, 5), 2);
        assert_eq!(calls.borrow().as_str(), "ab");
    }

    #[test]
    fn test_priority_order_within_tick() {
        let platform = MockPlatform::new();
        let kernel = booted_kernel(&platform);
        let calls = RefCell::new(String::new());
        let mut low = Recorder { name: "l", calls: &calls };
        let mut high = Recorder { name: "h", calls: &calls };
        let mut mid1 = Recorder { name: "1", calls: &calls };
        let mut mid2 = Recorder { name: "2", calls: &calls };
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register_with_priority("low", &mut low, 5, 0).unwrap();
        scheduler.register_with_priority("mid1", &mut mid1, 5, 2).unwrap();
        scheduler.register_with_priority("high", &mut high, 5, 9).unwrap();
        scheduler.register_with_priority("mid2", &mut mid2, 5, 2).unwrap();

        scheduler.tick_at(&kernel, 5);
        assert_eq!(calls.borrow().as_str(), "h12l");

        // Slot indices still follow registration
        assert_eq!(scheduler.find("high"), Some(2));
    }

    #[test]
    fn test_stop_unknown_is_noop() {
        let mut task = noop;
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("ui", &mut task, 100).unwrap();

        assert!(!scheduler.stop("x"));
        assert_eq!(scheduler.process_count(), 1);
        assert_eq!(scheduler.active_count(), 1);
        assert_eq!(scheduler.process(0).unwrap().state, ProcessState::Ready);
    }

    #[test]
    fn test_stop_terminates_and_keeps_slot_visible() {
        let platform = MockPlatform::new();
        let kernel = booted_kernel(&platform);
        let runs = Cell::new(0);
        let mut task = Counter { runs: &runs };
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("fs", &mut task, 10).unwrap();

        assert!(scheduler.stop("fs"));
        scheduler.tick_at(&kernel, 1000);
        assert_eq!(runs.get(), 0);

        assert_eq!(scheduler.process_count(), 1);
        let pcb = scheduler.process(0).unwrap();
        assert!(!pcb.active);
        assert_eq!(pcb.state, ProcessState::Terminated);

        // Terminated is one-way
        assert!(!scheduler.resume("fs"));
        assert!(!scheduler.stop("fs"));
        assert!(scheduler.processes().is_empty());
    }

    #[test]
    fn test_reregister_after_stop_uses_new_slot() {
        let (mut first, mut second) = (noop, noop);
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("shell", &mut first, 10).unwrap();
        scheduler.stop("shell");

        assert_eq!(scheduler.register("shell", &mut second, 10), Ok(1));
        assert_eq!(scheduler.process(0).unwrap().state, ProcessState::Terminated);
        assert_eq!(scheduler.find("shell"), Some(1));
    }

    #[test]
    fn test_suspend_resume_round_trip() {
        let platform = MockPlatform::new();
        let kernel = booted_kernel(&platform);
        let runs = Cell::new(0);
        let mut task = Counter { runs: &runs };
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("ui", &mut task, 100).unwrap();
        scheduler.tick_at(&kernel, 100);
        let before = scheduler.process(0).unwrap().clone();

        assert!(scheduler.suspend("ui"));
        assert_eq!(scheduler.process(0).unwrap().state, ProcessState::Blocked);
        assert!(!scheduler.suspend("ui"));
        assert!(scheduler.resume("ui"));

        let after = scheduler.process(0).unwrap();
        assert_eq!(after.state, ProcessState::Ready);
        assert_eq!(after.name, before.name);
        assert_eq!(after.interval, before.interval);
        assert_eq!(after.last_run, before.last_run);
        assert!(!scheduler.resume("ui"));
    }

    #[test]
    fn test_blocked_process_is_skipped_then_due_on_resume() {
        let platform = MockPlatform::new();
        let kernel = booted_kernel(&platform);
        let runs = Cell::new(0);
        let mut task = Counter { runs: &runs };
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("input", &mut task, 50).unwrap();
        scheduler.tick_at(&kernel, 50);
        assert_eq!(runs.get(), 1);

        scheduler.suspend("input");
        scheduler.tick_at(&kernel, 100);
        scheduler.tick_at(&kernel, 150);
        assert_eq!(runs.get(), 1);
        assert_eq!(scheduler.process(0).unwrap().last_run, 50);

        scheduler.resume("input");
        scheduler.tick_at(&kernel, 151);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_suspend_unknown_is_noop() {
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        assert!(!scheduler.suspend("ghost"));
        assert!(!scheduler.resume("ghost"));
        assert_eq!(scheduler.process_count(), 0);
    }

    #[test]
    fn test_process_index_bounds() {
        let mut task = noop;
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        assert!(scheduler.process(0).is_none());

        scheduler.register("ui", &mut task, 100).unwrap();
        assert!(scheduler.process(0).is_some());
        assert!(scheduler.process(1).is_none());
        assert!(scheduler.process(MAX_PROCESSES).is_none());
    }

    #[test]
    fn test_reclaim_policy_reuses_terminated_slot() {
        let mut tasks = [noop; 3];
        let [a, b, c] = &mut tasks;
        let mut scheduler: Scheduler<'_, 2> = Scheduler::with_policy(SlotPolicy::Reclaim);
        scheduler.register("a", a, 10).unwrap();
        scheduler.register("b", b, 10).unwrap();
        assert!(scheduler.stop("a"));

        assert_eq!(scheduler.register("c", c, 10), Ok(0));
        assert_eq!(scheduler.process_count(), 2);
        assert_eq!(scheduler.process(0).unwrap().name.as_str(), "c");
        assert_eq!(scheduler.process(0).unwrap().state, ProcessState::Ready);
    }

    #[test]
    fn test_reclaimed_slot_joins_end_of_dispatch_order() {
        let platform = MockPlatform::new();
        let kernel = booted_kernel(&platform);
        let calls = RefCell::new(String::new());
        let mut a = Recorder { name: "a", calls: &calls };
        let mut b = Recorder { name: "b", calls: &calls };
        let mut c = Recorder { name: "c", calls: &calls };
        let mut scheduler: Scheduler<'_, 2> = Scheduler::with_policy(SlotPolicy::Reclaim);
        scheduler.register("a", &mut a, 5).unwrap();
        scheduler.register("b", &mut b, 5).unwrap();
        scheduler.stop("a");
        scheduler.register("c", &mut c, 5).unwrap();

        scheduler.tick_at(&kernel, 5);
        assert_eq!(calls.borrow().as_str(), "bc");
    }

    #[test]
    fn test_append_policy_never_reuses() {
        let mut tasks = [noop; 3];
        let [a, b, c] = &mut tasks;
        let mut scheduler: Scheduler<'_, 2> = Scheduler::with_policy(SlotPolicy::Append);
        scheduler.register("a", a, 10).unwrap();
        scheduler.register("b", b, 10).unwrap();
        scheduler.stop("a");

        assert_eq!(scheduler.register("c", c, 10), Err(SchedulerError::ResourceExhausted));
        assert_eq!(scheduler.process(0).unwrap().state, ProcessState::Terminated);
    }

    #[test]
    fn test_processes_lists_active_only() {
        let mut tasks = [noop; 3];
        let [a, b, c] = &mut tasks;
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("ui", a, 100).unwrap();
        scheduler.register("input", b, 50).unwrap();
        scheduler.register("fs", c, 1000).unwrap();
        scheduler.stop("input");
        scheduler.suspend("fs");

        let list = scheduler.processes();
        assert_eq!(list.len(), 2);
        assert_eq!((list[0].index, list[0].name.as_str()), (0, "ui"));
        assert_eq!((list[1].index, list[1].state), (2, ProcessState::Blocked));
    }

    #[test]
    fn test_task_sees_itself_running() {
        let platform = MockPlatform::new();
        let kernel = booted_kernel(&platform);
        let seen = Cell::new(None);
        let mut ps = |ctx: &TaskContext<'_>| {
            let table = ctx.processes();
            let slot = table.find("ps").unwrap();
            seen.set(Some((table.get(slot).unwrap().state, table.count(), ctx.now())));
        };
        let mut other = noop;
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("other", &mut other, 1000).unwrap();
        scheduler.register("ps", &mut ps, 10).unwrap();

        scheduler.tick_at(&kernel, 10);
        assert_eq!(seen.get(), Some((ProcessState::Running, 2, 10)));
        assert_eq!(scheduler.process(1).unwrap().state, ProcessState::Ready);
    }

    #[test]
    fn test_task_can_query_kernel() {
        let platform = MockPlatform::new();
        platform.set_now(1000);
        let kernel = booted_kernel(&platform);
        let observed = Cell::new((0, SystemState::Boot));
        let mut status = |ctx: &TaskContext<'_>| {
            let kernel = ctx.kernel();
            observed.set((kernel.uptime(), kernel.state()));
        };
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("status", &mut status, 0).unwrap();

        platform.set_now(3500);
        scheduler.tick(&kernel);
        assert_eq!(observed.get(), (2500, SystemState::Running));
    }

    #[test]
    fn test_zero_interval_runs_every_tick() {
        let platform = MockPlatform::new();
        let kernel = booted_kernel(&platform);
        let runs = Cell::new(0);
        let mut task = Counter { runs: &runs };
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("shell", &mut task, 0).unwrap();

        scheduler.tick_at(&kernel, 0);
        scheduler.tick_at(&kernel, 0);
        scheduler.tick_at(&kernel, 1);
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn test_idle_ticks_count_ticks_that_ran_nothing() {
        let platform = MockPlatform::new();
        let kernel = booted_kernel(&platform);
        let mut task = noop;
        let mut scheduler: Scheduler<'_> = Scheduler::new();
        scheduler.register("ui", &mut task, 100).unwrap();

        for t in [10, 50, 99] {
            assert_eq!(scheduler.tick_at(&kernel, t), 0);
        }
        assert_eq!(scheduler.tick_at(&kernel, 100), 1);

        assert_eq!(scheduler.tick_count(), 4);
        assert_eq!(scheduler.idle_ticks(), 3);
    }
}
