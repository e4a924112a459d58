//! # Minux: Cooperative Kernel for Tiny Devices
//!
//! A cooperative, fixed-capacity task scheduler and kernel-state manager
//! for ARM Cortex-M4 microcontrollers with a few kilobytes of RAM.
//!
//! ## Overview
//!
//! Minux gives a handful of periodic routines (display refresh, input
//! polling, filesystem housekeeping, shell processing) the illusion of
//! running concurrently on a single thread:
//!
//! - **No preemption**: each task runs to completion inside `tick()`
//! - **No heap**: the process table is a fixed array of `MAX_PROCESSES` slots
//! - **No globals**: the kernel and scheduler are plain values created in
//!   `main` and passed by reference
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │     Tasks (display · input · filesystem · shell)        │
//! │          impl Task / FnMut(&TaskContext)                │
//! ├───────────────────────────┬────────────────────────────┤
//! │  Scheduler (scheduler.rs) │  Kernel (kernel.rs)        │
//! │  ─ register() · stop()    │  ─ init() · uptime()       │
//! │  ─ suspend() · resume()   │  ─ memory_info()           │
//! │  ─ tick()                 │  ─ state() · panic()       │
//! ├───────────────────────────┴────────────────────────────┤
//! │        Process Model (task.rs)                          │
//! │    PCB · ProcessState · Task · TaskContext              │
//! ├────────────────────────────────────────────────────────┤
//! │        Platform (arch/) · Sync (sync.rs)                │
//! │    SysTick clock · memory probe · halt · ITM log        │
//! ├────────────────────────────────────────────────────────┤
//! │         ARM Cortex-M4 Hardware (Thumb-2)                │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Main Loop
//!
//! ```ignore
//! let board = CortexM4::init(&mut cp.SYST, &mut cp.SCB);
//! let mut kernel = Kernel::new(&board);
//! kernel.init();
//!
//! let mut scheduler: Scheduler<'_> = Scheduler::new();
//! scheduler.register("ui", &mut display, UI_UPDATE_MS)?;
//!
//! loop {
//!     scheduler.tick(&kernel);
//!     cortex_m::asm::wfi();
//! }
//! ```
//!
//! ## Memory Model
//!
//! - **No `alloc`**: pure `core` plus `heapless` containers
//! - **Fixed-size process table**: `[ProcessControlBlock; N]`
//! - **Borrowed tasks**: the scheduler stores `&mut dyn Task`, the
//!   registering code keeps ownership
//! - **Critical sections** only around state shared with SysTick

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod task;
pub mod scheduler;
pub mod arch;
pub mod kernel;
pub mod sync;

pub use kernel::{Kernel, KernelError, MemInfo, SystemState};
pub use scheduler::{Scheduler, SchedulerError, SlotPolicy};
pub use task::{ProcessControlBlock, ProcessInfo, ProcessState, Task, TaskContext};
