//! The mandatory idle process.
//!
//! Lowest priority, always ready, so `highest_priority(ready_map)` is
//! defined at every scheduling point.

use crate::config::IDLE_PROCESS_STACK_SIZE;
use crate::kernel::khal;
use crate::kernel::priority::IDLE_PRIORITY;
use crate::kernel::process::Process;

#[cfg(feature = "idle-hook")]
unsafe extern "Rust" {
    fn _kestrel_idle_hook();
}

fn idle_entry() {
    loop {
        #[cfg(feature = "idle-hook")]
        unsafe {
            _kestrel_idle_hook()
        };
        khal::on_idle();
    }
}

pub(crate) fn init_idle_process() {
    static IDLE: Process<IDLE_PROCESS_STACK_SIZE> =
        Process::new("[idle]", IDLE_PRIORITY, idle_entry);
    IDLE.init();
}
