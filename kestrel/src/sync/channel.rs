//! Typed bounded channel.
//!
//! A FIFO of capacity `N` with separate producer and consumer waiter sets.
//! Blocking operations re-check their predicate after every wakeup: a
//! wakeup is advisory, another producer or consumer may have won the race
//! for the slot in between.

use crate::kernel::agent::KernelAgent;
use crate::kernel::priority::TimeoutCount;
use crate::kernel::waiter::WaiterMap;
use crate::sync::interrupt_lock::{InterruptLock, InterruptLockKey};
use core::cell::UnsafeCell;
use heapless::Deque;

pub struct Channel<T, const N: usize> {
    fifo: UnsafeCell<Deque<T, N>>,
    producers: WaiterMap,
    consumers: WaiterMap,
}

unsafe impl<T: Send, const N: usize> Sync for Channel<T, N> {}

impl<T, const N: usize> Channel<T, N> {
    pub const fn new() -> Channel<T, N> {
        Channel {
            fifo: UnsafeCell::new(Deque::new()),
            producers: WaiterMap::new(),
            consumers: WaiterMap::new(),
        }
    }

    // FIFO access never outlives one critical-section step; in particular
    // no borrow is held across a suspension.
    #[inline(always)]
    fn with_fifo<R>(&self, _key: InterruptLockKey<'_>, f: impl FnOnce(&mut Deque<T, N>) -> R) -> R {
        f(unsafe { &mut *self.fifo.get() })
    }

    /// Append at the tail; blocks while the FIFO is full.
    pub fn push(&self, item: T) {
        InterruptLock::with(|key| {
            while self.with_fifo(key, |q| q.is_full()) {
                KernelAgent::suspend(key, &self.producers);
            }
            self.with_fifo(key, |q| {
                let _ = q.push_back(item);
            });
            KernelAgent::resume_next_ready(key, &self.consumers);
        })
    }

    /// Prepend at the head; blocks while the FIFO is full.
    pub fn push_front(&self, item: T) {
        InterruptLock::with(|key| {
            while self.with_fifo(key, |q| q.is_full()) {
                KernelAgent::suspend(key, &self.producers);
            }
            self.with_fifo(key, |q| {
                let _ = q.push_front(item);
            });
            KernelAgent::resume_next_ready(key, &self.consumers);
        })
    }

    /// Take from the head. `timeout == 0` waits without a deadline;
    /// `None` is returned iff the wait timed out.
    pub fn pop(&self, timeout: TimeoutCount) -> Option<T> {
        InterruptLock::with(|key| {
            loop {
                if let Some(item) = self.with_fifo(key, |q| q.pop_front()) {
                    KernelAgent::resume_next_ready(key, &self.producers);
                    return Some(item);
                }
                KernelAgent::set_cur_timeout(key, timeout);
                KernelAgent::suspend(key, &self.consumers);
                if KernelAgent::is_timeouted(key, &self.consumers) {
                    KernelAgent::clear_timeouted(key, &self.consumers);
                    return None;
                }
                KernelAgent::clear_cur_timeout(key);
            }
        })
    }

    /// Take from the tail (newest first).
    pub fn pop_back(&self, timeout: TimeoutCount) -> Option<T> {
        InterruptLock::with(|key| {
            loop {
                if let Some(item) = self.with_fifo(key, |q| q.pop_back()) {
                    KernelAgent::resume_next_ready(key, &self.producers);
                    return Some(item);
                }
                KernelAgent::set_cur_timeout(key, timeout);
                KernelAgent::suspend(key, &self.consumers);
                if KernelAgent::is_timeouted(key, &self.consumers) {
                    KernelAgent::clear_timeouted(key, &self.consumers);
                    return None;
                }
                KernelAgent::clear_cur_timeout(key);
            }
        })
    }

    pub fn get_count(&self) -> usize {
        InterruptLock::with(|key| self.with_fifo(key, |q| q.len()))
    }

    pub fn get_free_size(&self) -> usize {
        InterruptLock::with(|key| self.with_fifo(key, |q| q.capacity() - q.len()))
    }

    /// Discard everything buffered and release blocked producers.
    pub fn flush(&self) {
        InterruptLock::with(|key| {
            self.with_fifo(key, |q| while q.pop_front().is_some() {});
            KernelAgent::resume_all(key, &self.producers);
        })
    }
}

impl<T: Copy, const N: usize> Channel<T, N> {
    /// Blocking bulk append: waits until all of `data` fits, then appends
    /// it in one step. `data` must not exceed the channel capacity.
    pub fn write(&self, data: &[T]) {
        InterruptLock::with(|key| {
            loop {
                let free = self.with_fifo(key, |q| q.capacity() - q.len());
                if free >= data.len() {
                    break;
                }
                KernelAgent::suspend(key, &self.producers);
            }
            self.with_fifo(key, |q| {
                for &item in data {
                    let _ = q.push_back(item);
                }
            });
            KernelAgent::resume_all(key, &self.consumers);
        })
    }

    /// Blocking bulk take: waits until `buf` can be filled completely.
    /// Returns false iff the wait timed out; `buf` is untouched then.
    pub fn read(&self, buf: &mut [T], timeout: TimeoutCount) -> bool {
        InterruptLock::with(|key| {
            loop {
                let available = self.with_fifo(key, |q| q.len());
                if available >= buf.len() {
                    break;
                }
                KernelAgent::set_cur_timeout(key, timeout);
                KernelAgent::suspend(key, &self.consumers);
                if KernelAgent::is_timeouted(key, &self.consumers) {
                    KernelAgent::clear_timeouted(key, &self.consumers);
                    return false;
                }
                KernelAgent::clear_cur_timeout(key);
            }
            self.with_fifo(key, |q| {
                for slot in buf.iter_mut() {
                    if let Some(item) = q.pop_front() {
                        *slot = item;
                    }
                }
            });
            KernelAgent::resume_all(key, &self.producers);
            true
        })
    }

    /// Non-blocking bulk append from interrupt context: writes as much as
    /// fits, returns the number written.
    pub fn write_isr(&self, data: &[T]) -> usize {
        InterruptLock::with(|key| {
            let written = self.with_fifo(key, |q| {
                let n = data.len().min(q.capacity() - q.len());
                for &item in &data[..n] {
                    let _ = q.push_back(item);
                }
                n
            });
            if written > 0 {
                KernelAgent::resume_all_isr(key, &self.consumers);
            }
            written
        })
    }

    /// Non-blocking bulk take from interrupt context: reads what is
    /// available, returns the number read.
    pub fn read_isr(&self, buf: &mut [T]) -> usize {
        InterruptLock::with(|key| {
            let read = self.with_fifo(key, |q| {
                let n = buf.len().min(q.len());
                for slot in buf[..n].iter_mut() {
                    if let Some(item) = q.pop_front() {
                        *slot = item;
                    }
                }
                n
            });
            if read > 0 {
                KernelAgent::resume_all_isr(key, &self.producers);
            }
            read
        })
    }
}
