//! # Minux Firmware
//!
//! Boots the kernel and drives the built-in tasks from a cooperative main
//! loop:
//!
//! | Process | Period | Priority | Role |
//! |---------|--------|----------|------|
//! | `input` | `INPUT_POLL_MS` | 2 | Button sampling and debounce |
//! | `ui` | `UI_UPDATE_MS` | 1 | Status bar refresh |
//! | `fs` | `FS_MAINTENANCE_MS` | 1 | File table housekeeping |
//! | `shell` | `SHELL_POLL_MS` | 0 | Input polling, `uptime` / `mem` / `ps` report every `STATUS_REPORT_MS` |
//!
//! The display, filesystem and shell themselves live outside the kernel;
//! the tasks below stand in for their periodic entry points.

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]

#[cfg(target_arch = "arm")]
mod firmware {
    use cortex_m_rt::entry;
    use panic_halt as _;

    use minux::arch::cortex_m4::{self, CortexM4};
    use minux::arch::Platform;
    use minux::config::{
        FS_MAINTENANCE_MS, INPUT_POLL_MS, SHELL_POLL_MS, STATUS_REPORT_MS, UI_UPDATE_MS,
    };
    use minux::{Kernel, Scheduler, SystemState, Task, TaskContext};

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Status bar refresh. Redraws uptime and memory usage once per second
    /// and only bumps the frame counter in between.
    struct DisplayTask {
        frames: u32,
    }

    impl Task for DisplayTask {
        fn run(&mut self, ctx: &TaskContext<'_>) {
            self.frames = self.frames.wrapping_add(1);
            if self.frames % 10 == 0 {
                let kernel = ctx.kernel();
                log::trace!(
                    "[ui] up {}s, mem {}%",
                    kernel.uptime_secs(),
                    kernel.last_memory_info().fragmentation
                );
            }
        }
    }

    /// Button sampling. A press is reported once the raw level has been
    /// stable for two consecutive polls.
    struct InputTask {
        raw: bool,
        stable: bool,
        samples: u8,
    }

    impl InputTask {
        fn sample(&mut self, level: bool) -> Option<bool> {
            if level != self.raw {
                self.raw = level;
                self.samples = 0;
                return None;
            }
            self.samples = self.samples.saturating_add(1);
            if self.samples >= 2 && self.raw != self.stable {
                self.stable = self.raw;
                return Some(self.stable);
            }
            None
        }
    }

    impl Task for InputTask {
        fn run(&mut self, _ctx: &TaskContext<'_>) {
            // No buttons are wired on the reference board; sample idle level
            if let Some(pressed) = self.sample(false) {
                log::debug!("[input] button {}", if pressed { "down" } else { "up" });
            }
        }
    }

    /// File table housekeeping.
    struct FsTask {
        passes: u32,
    }

    impl Task for FsTask {
        fn run(&mut self, ctx: &TaskContext<'_>) {
            self.passes = self.passes.wrapping_add(1);
            log::trace!("[fs] maintenance pass {} at {} ms", self.passes, ctx.now());
        }
    }

    /// Shell input polling. No console is wired on the reference board, so
    /// each poll only checks whether the periodic status report is due.
    struct ShellTask {
        last_report: u64,
    }

    impl ShellTask {
        /// What `uptime`, `mem` and `ps` print.
        fn report(ctx: &TaskContext<'_>) {
            let kernel = ctx.kernel();
            log::info!("Uptime: {} seconds ({})", kernel.uptime_secs(), kernel.state());
            log::info!("{}", kernel.memory_info());
            log::info!("PID NAME      STATE");
            for (index, pcb) in ctx.processes().iter() {
                log::info!("{:<4}{:<10}{}", index, pcb.name.as_str(), pcb.state);
            }
        }
    }

    impl Task for ShellTask {
        fn run(&mut self, ctx: &TaskContext<'_>) {
            if ctx.now().saturating_sub(self.last_report) >= u64::from(STATUS_REPORT_MS) {
                self.last_report = ctx.now();
                Self::report(ctx);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Main entry point
    // -----------------------------------------------------------------------

    /// Firmware entry point. Starts the clock and the kernel, registers the
    /// built-in tasks and runs the cooperative loop. Does not return.
    #[entry]
    fn main() -> ! {
        let Some(mut cp) = cortex_m::Peripherals::take() else {
            // Only reachable if something took the peripherals before reset
            loop {
                cortex_m::asm::wfi();
            }
        };

        cortex_m4::install_logger(cp.ITM, log::LevelFilter::Info);
        let board = CortexM4::init(&mut cp.SYST, &mut cp.SCB);

        let mut kernel = Kernel::new(&board);
        kernel.init();

        let mut display = DisplayTask { frames: 0 };
        let mut input = InputTask {
            raw: false,
            stable: false,
            samples: 0,
        };
        let mut fs = FsTask { passes: 0 };
        let mut shell = ShellTask { last_report: 0 };

        let mut scheduler: Scheduler<'_> = Scheduler::new();
        let registered = [
            scheduler.register_with_priority("input", &mut input, INPUT_POLL_MS, 2),
            scheduler.register("ui", &mut display, UI_UPDATE_MS),
            scheduler.register("fs", &mut fs, FS_MAINTENANCE_MS),
            scheduler.register_with_priority("shell", &mut shell, SHELL_POLL_MS, 0),
        ];
        for result in registered {
            if let Err(err) = result {
                kernel.panic(err.as_str());
            }
        }
        log::info!("{} processes started", scheduler.active_count());

        loop {
            match kernel.state() {
                SystemState::Shutdown => {
                    log::info!("Shutting down");
                    board.halt();
                }
                SystemState::Error => kernel.panic("error state outside panic"),
                _ => {
                    // Sleep only when nothing was due; SysTick wakes us every millisecond
                    if scheduler.tick(&kernel) == 0 {
                        cortex_m::asm::wfi();
                    }
                }
            }
        }
    }
}

/// Host builds only exist for unit tests; the firmware targets
/// `thumbv7em-none-eabihf`.
#[cfg(not(target_arch = "arm"))]
fn main() {}
