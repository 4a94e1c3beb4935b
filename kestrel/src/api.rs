//! Public kernel API.

use crate::kernel::khal;
use crate::kernel::priority::{ProcessPriority, TimeoutCount};
use crate::kernel::process::ProcessRef;
use crate::kernel::scheduler::{self, kernel};
use crate::sync::interrupt_lock::InterruptLock;

/// Start the operating system: transfer control to the highest-priority
/// process. All processes must have been initialized before this call.
/// Never returns.
pub fn run() -> ! {
    scheduler::run()
}

/// Block the calling process for `timeout` system ticks. A zero timeout
/// sleeps without a deadline; only `wake_up`/`force_wake_up` from another
/// process (or an ISR) ends it.
pub fn sleep(timeout: TimeoutCount) {
    InterruptLock::with(|key| kernel().sleep(key, timeout))
}

/// Kernel tick counter since startup (wrapping).
#[cfg(feature = "system-ticks")]
pub fn get_tick_count() -> TimeoutCount {
    InterruptLock::with(|key| kernel().tick_count(key))
}

/// Stop the system timer; no ticks are delivered until
/// [`unlock_system_timer`] is called. Timeouts stop advancing.
pub fn lock_system_timer() {
    InterruptLock::with(|_key| khal::lock_system_timer())
}

pub fn unlock_system_timer() {
    InterruptLock::with(|_key| khal::unlock_system_timer())
}

/// Handle of the process registered at `priority`.
pub fn get_proc(priority: ProcessPriority) -> Option<ProcessRef> {
    if priority as usize >= crate::config::PROCESS_COUNT {
        return None;
    }
    InterruptLock::with(|key| kernel().process(key, priority).map(ProcessRef::new))
}
