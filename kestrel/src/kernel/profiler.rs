//! Run-time distribution profiler.
//!
//! Accumulates per-priority execution time between context switches. Feed
//! it from the context-switch user hook (the `context-switch-hook`
//! feature), where the outgoing process is still the current one:
//!
//! ```ignore
//! static PROFILER: Profiler = Profiler::new();
//!
//! #[unsafe(no_mangle)]
//! fn _kestrel_context_switch_hook() {
//!     PROFILER.advance();
//! }
//! ```
//!
//! `process_data()` folds the raw counters into parts-per-thousand of the
//! observation window and restarts the window.

use crate::cell::LockedCell;
use crate::config::PROCESS_COUNT;
use crate::kernel::khal;
use crate::kernel::priority::ProcessPriority;
use crate::kernel::scheduler::kernel;
use crate::sync::interrupt_lock::InterruptLock;

pub struct Profiler {
    counters: [LockedCell<u32>; PROCESS_COUNT],
    results: [LockedCell<u16>; PROCESS_COUNT],
    last_stamp: LockedCell<u32>,
}

impl Profiler {
    pub const fn new() -> Profiler {
        Profiler {
            counters: [const { LockedCell::new(0) }; PROCESS_COUNT],
            results: [const { LockedCell::new(0) }; PROCESS_COUNT],
            last_stamp: LockedCell::new(0),
        }
    }

    /// Charge the cycles since the previous call to the process being
    /// switched out.
    pub fn advance(&self) {
        InterruptLock::with(|key| {
            let now = khal::cycle_count();
            let elapsed = now.wrapping_sub(self.last_stamp.get(key));
            self.last_stamp.set(key, now);

            let priority = kernel().cur_priority(key) as usize;
            let counter = self.counters[priority].get(key);
            self.counters[priority].set(key, counter.saturating_add(elapsed));
        })
    }

    /// Normalize the counters to parts-per-thousand of the window since the
    /// previous call, then restart the window.
    pub fn process_data(&self) {
        InterruptLock::with(|key| {
            let total: u64 = self
                .counters
                .iter()
                .map(|counter| counter.get(key) as u64)
                .sum();
            for i in 0..PROCESS_COUNT {
                let share = if total == 0 {
                    0
                } else {
                    (self.counters[i].get(key) as u64 * 1000 / total) as u16
                };
                self.results[i].set(key, share);
                self.counters[i].set(key, 0);
            }
        })
    }

    /// Share of the last processed window spent at `priority`, in parts
    /// per thousand.
    pub fn result(&self, priority: ProcessPriority) -> u16 {
        InterruptLock::with(|key| self.results[priority as usize].get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_sums_to_the_window() {
        let profiler = Profiler::new();
        InterruptLock::with(|key| {
            profiler.counters[0].set(key, 600);
            profiler.counters[1].set(key, 300);
            profiler.counters[2].set(key, 100);
        });
        profiler.process_data();

        assert_eq!(profiler.result(0), 600);
        assert_eq!(profiler.result(1), 300);
        assert_eq!(profiler.result(2), 100);
        for priority in 3..PROCESS_COUNT as ProcessPriority {
            assert_eq!(profiler.result(priority), 0);
        }

        // Counters were reset; an empty window normalizes to zero.
        profiler.process_data();
        assert_eq!(profiler.result(0), 0);
    }
}
