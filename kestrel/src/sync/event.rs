//! Broadcast binary event flag.

use crate::cell::LockedCell;
use crate::kernel::agent::KernelAgent;
use crate::kernel::priority::TimeoutCount;
use crate::kernel::waiter::WaiterMap;
use crate::sync::interrupt_lock::InterruptLock;

/// A binary event with broadcast wakeup and a single pending latch.
///
/// `signal()` readies every process waiting at that moment; if no process
/// is waiting, the event latches and the next `wait()` consumes it without
/// suspending. One latched signal satisfies exactly one `wait`.
pub struct EventFlag {
    value: LockedCell<bool>,
    waiters: WaiterMap,
}

impl EventFlag {
    pub const fn new() -> EventFlag {
        EventFlag {
            value: LockedCell::new(false),
            waiters: WaiterMap::new(),
        }
    }

    /// Wait for the event. `timeout == 0` waits without a deadline.
    /// Returns false iff the wait timed out.
    pub fn wait(&self, timeout: TimeoutCount) -> bool {
        InterruptLock::with(|key| {
            if self.value.get(key) {
                self.value.set(key, false);
                return true;
            }
            KernelAgent::set_cur_timeout(key, timeout);
            KernelAgent::suspend(key, &self.waiters);
            if KernelAgent::is_timeouted(key, &self.waiters) {
                KernelAgent::clear_timeouted(key, &self.waiters);
                return false;
            }
            KernelAgent::clear_cur_timeout(key);
            true
        })
    }

    /// Ready all waiters, or latch the event if there are none.
    pub fn signal(&self) {
        InterruptLock::with(|key| {
            if !KernelAgent::resume_all(key, &self.waiters) {
                self.value.set(key, true);
            }
        })
    }

    /// As `signal`, from interrupt context: the ISR exit guard performs any
    /// resulting switch.
    pub fn signal_isr(&self) {
        InterruptLock::with(|key| {
            if !KernelAgent::resume_all_isr(key, &self.waiters) {
                self.value.set(key, true);
            }
        })
    }

    /// Drop a latched signal.
    pub fn clear(&self) {
        InterruptLock::with(|key| self.value.set(key, false))
    }

    pub fn is_signaled(&self) -> bool {
        InterruptLock::with(|key| self.value.get(key))
    }
}
