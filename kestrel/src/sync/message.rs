//! Typed single-slot message: an event flag carrying a payload.

use crate::cell::LockedCell;
use crate::kernel::agent::KernelAgent;
use crate::kernel::priority::TimeoutCount;
use crate::kernel::waiter::WaiterMap;
use crate::sync::interrupt_lock::InterruptLock;
use core::cell::UnsafeCell;

/// A broadcast event with an in-place `T` payload.
///
/// `assign` stores the payload without signalling; `send` readies the
/// waiters (or latches when there are none). The slot keeps its last value
/// between sends, so a receiver may `get` at any time.
pub struct Message<T> {
    non_empty: LockedCell<bool>,
    waiters: WaiterMap,
    slot: UnsafeCell<T>,
}

unsafe impl<T: Send + Copy> Sync for Message<T> {}

impl<T: Copy> Message<T> {
    pub const fn new(initial: T) -> Message<T> {
        Message {
            non_empty: LockedCell::new(false),
            waiters: WaiterMap::new(),
            slot: UnsafeCell::new(initial),
        }
    }

    /// Store the payload. Does not signal.
    pub fn assign(&self, msg: T) {
        InterruptLock::with(|_key| unsafe { *self.slot.get() = msg })
    }

    /// Signal the message: ready all waiters, or latch if none wait.
    pub fn send(&self) {
        InterruptLock::with(|key| {
            if !KernelAgent::resume_all(key, &self.waiters) {
                self.non_empty.set(key, true);
            }
        })
    }

    pub fn send_isr(&self) {
        InterruptLock::with(|key| {
            if !KernelAgent::resume_all_isr(key, &self.waiters) {
                self.non_empty.set(key, true);
            }
        })
    }

    /// Wait for a send. `timeout == 0` waits without a deadline. Returns
    /// false iff the wait timed out.
    pub fn wait(&self, timeout: TimeoutCount) -> bool {
        InterruptLock::with(|key| {
            if self.non_empty.get(key) {
                self.non_empty.set(key, false);
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

    /// Copy the payload out.
    pub fn get(&self) -> T {
        InterruptLock::with(|_key| unsafe { *self.slot.get() })
    }

    pub fn out(&self, dst: &mut T) {
        *dst = self.get();
    }
}
