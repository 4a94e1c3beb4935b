//! Ownership-tagged binary lock.
//!
//! [`RawMutex`] carries the kernel semantics: the owner is recorded as a
//! process tag, and `unlock()` hands the lock directly to the
//! highest-priority waiter, so a freshly arriving `lock()` can never race
//! past a process that was already queued. [`Mutex`] wraps a value behind a
//! [`RawMutex`] with a scoped guard.
//!
//! No priority inheritance; deadlock avoidance is the caller's
//! responsibility.

use crate::cell::LockedCell;
use crate::kernel::agent::KernelAgent;
use crate::kernel::exception::RuntimeError;
use crate::kernel::priority::{ProcessMap, TimeoutCount};
use crate::kernel::waiter::WaiterMap;
use crate::runtime_error;
use crate::sync::interrupt_lock::InterruptLock;
use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

pub struct RawMutex {
    // Tag of the owning process; empty when unlocked. At any instant at
    // most one process's tag equals this value.
    owner_tag: LockedCell<ProcessMap>,
    waiters: WaiterMap,
}

impl RawMutex {
    pub const fn new() -> RawMutex {
        RawMutex {
            owner_tag: LockedCell::new(ProcessMap::EMPTY),
            waiters: WaiterMap::new(),
        }
    }

    /// Acquire the lock, blocking without a deadline.
    pub fn lock(&self) {
        InterruptLock::with(|key| {
            let tag = KernelAgent::cur_proc_tag(key);
            if self.owner_tag.get(key).is_empty() {
                self.owner_tag.set(key, tag);
                return;
            }
            KernelAgent::suspend(key, &self.waiters);
            // Resumed: the unlocker transferred ownership to this process.
            // (A forced wake lands here too and takes the lock over; see
            // force_wake_up.)
            self.owner_tag.set(key, tag);
        })
    }

    /// Acquire the lock only if it is free.
    pub fn try_lock(&self) -> bool {
        InterruptLock::with(|key| {
            if self.owner_tag.get(key).is_empty() {
                self.owner_tag.set(key, KernelAgent::cur_proc_tag(key));
                true
            } else {
                false
            }
        })
    }

    /// Acquire with a deadline. On timeout no unlocker chose this process,
    /// so it does not own the mutex and false is returned. `timeout == 0`
    /// is an unbounded wait.
    pub fn lock_timeout(&self, timeout: TimeoutCount) -> bool {
        InterruptLock::with(|key| {
            let tag = KernelAgent::cur_proc_tag(key);
            if self.owner_tag.get(key).is_empty() {
                self.owner_tag.set(key, tag);
                return true;
            }
            KernelAgent::set_cur_timeout(key, timeout);
            KernelAgent::suspend(key, &self.waiters);
            if KernelAgent::is_timeouted(key, &self.waiters) {
                KernelAgent::clear_timeouted(key, &self.waiters);
                return false;
            }
            KernelAgent::clear_cur_timeout(key);
            self.owner_tag.set(key, tag);
            true
        })
    }

    /// Release the lock. Only the owner may unlock; ownership passes
    /// directly to the highest-priority waiter, if any.
    pub fn unlock(&self) {
        InterruptLock::with(|key| {
            if self.owner_tag.get(key) != KernelAgent::cur_proc_tag(key) {
                runtime_error!(RuntimeError::MutexOwnerViolation);
            }
            // Record the new owner before the scheduler can run the waiter,
            // so no later write clobbers a transfer that already happened.
            let next = KernelAgent::resume_next_ready_isr(key, &self.waiters);
            self.owner_tag.set(key, next);
            if !next.is_empty() {
                KernelAgent::reschedule(key);
            }
        })
    }

    /// Release from interrupt context. No ownership check: the interrupted
    /// process is unrelated to the lock holder.
    pub fn unlock_isr(&self) {
        InterruptLock::with(|key| {
            let next = KernelAgent::resume_next_ready_isr(key, &self.waiters);
            self.owner_tag.set(key, next);
        })
    }

    pub fn is_locked(&self) -> bool {
        InterruptLock::with(|key| !self.owner_tag.get(key).is_empty())
    }
}

/// Data-carrying mutex with a scoped guard.
pub struct Mutex<T: ?Sized> {
    raw: RawMutex,
    data: UnsafeCell<T>,
}

unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    pub const fn new(value: T) -> Mutex<T> {
        Mutex {
            raw: RawMutex::new(),
            data: UnsafeCell::new(value),
        }
    }
}

impl<T: ?Sized> Mutex<T> {
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.raw.lock();
        MutexGuard { mutex: self }
    }

    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        if self.raw.try_lock() {
            Some(MutexGuard { mutex: self })
        } else {
            None
        }
    }

    pub fn lock_timeout(&self, timeout: TimeoutCount) -> Option<MutexGuard<'_, T>> {
        if self.raw.lock_timeout(timeout) {
            Some(MutexGuard { mutex: self })
        } else {
            None
        }
    }
}

pub struct MutexGuard<'a, T: ?Sized + 'a> {
    mutex: &'a Mutex<T>,
}

impl<T: ?Sized> Deref for MutexGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T: ?Sized> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.raw.unlock();
    }
}
