//! The kernel singleton and the scheduler.
//!
//! Scheduling is O(1): the ready set is a bitmap indexed by priority, and
//! the next process to run is always the highest-priority member. Control
//! transfer uses one of two schemes, selected at build time:
//!
//! - **Direct** (default): the scheduler calls the port's `switch_context`
//!   inline, under the critical section the caller already holds.
//!
//! - **Deferred** (`deferred-switch`): the scheduler records the target
//!   priority, pends the port's software context-switch trap, and
//!   spin-releases the interrupt mask until the trap has executed. The
//!   spin-release loop is what makes the scheme sound: a single
//!   enable/nop/disable sequence would let a hardware interrupt win the
//!   window and re-mask before the trap is taken, silently losing the
//!   switch. Nothing passes the loop until `cur_priority` has caught up
//!   with `sched_priority`, i.e. until the trap has actually run.

use crate::cell::LockedCell;
use crate::config::PROCESS_COUNT;
use crate::kernel::exception::RuntimeError;
use crate::kernel::khal::{self, Context};
use crate::kernel::priority::{LAST_PRIORITY, ProcessMap, ProcessPriority, TimeoutCount};
use crate::kernel::process::RawProcess;
use crate::kernel::waiter::WaiterMap;
use crate::printkln;
use crate::runtime_error;
use crate::sync::interrupt_lock::{InterruptLock, InterruptLockKey};

#[cfg(feature = "context-switch-hook")]
unsafe extern "Rust" {
    fn _kestrel_context_switch_hook();
}

#[cfg(feature = "systimer-hook")]
unsafe extern "Rust" {
    fn _kestrel_systimer_hook();
}

pub(crate) struct Kernel {
    cur_priority: LockedCell<ProcessPriority>,

    #[cfg(feature = "deferred-switch")]
    sched_priority: LockedCell<ProcessPriority>,

    ready_map: LockedCell<ProcessMap>,

    isr_nest_count: LockedCell<u8>,

    #[cfg(feature = "system-ticks")]
    tick_count: LockedCell<TimeoutCount>,

    table: [LockedCell<Option<&'static RawProcess>>; PROCESS_COUNT],
}

static KERNEL: Kernel = Kernel::new();

#[inline(always)]
pub(crate) fn kernel() -> &'static Kernel {
    &KERNEL
}

impl Kernel {
    const fn new() -> Kernel {
        Kernel {
            cur_priority: LockedCell::new(0),
            #[cfg(feature = "deferred-switch")]
            sched_priority: LockedCell::new(0),
            ready_map: LockedCell::new(ProcessMap::EMPTY),
            isr_nest_count: LockedCell::new(0),
            #[cfg(feature = "system-ticks")]
            tick_count: LockedCell::new(0),
            table: [const { LockedCell::new(None) }; PROCESS_COUNT],
        }
    }

    pub(crate) fn register(&self, key: InterruptLockKey<'_>, proc: &'static RawProcess) {
        let priority = proc.priority() as usize;
        if priority >= PROCESS_COUNT || self.table[priority].get(key).is_some() {
            runtime_error!(RuntimeError::PriorityConflict);
        }
        self.table[priority].set(key, Some(proc));
        if !proc.start_suspended() {
            self.ready_insert(key, proc.tag());
        }
    }

    #[inline(always)]
    pub(crate) fn process(
        &self,
        key: InterruptLockKey<'_>,
        priority: ProcessPriority,
    ) -> Option<&'static RawProcess> {
        self.table[priority as usize].get(key)
    }

    #[inline(always)]
    pub(crate) fn cur_priority(&self, key: InterruptLockKey<'_>) -> ProcessPriority {
        self.cur_priority.get(key)
    }

    pub(crate) fn cur_proc(&self, key: InterruptLockKey<'_>) -> &'static RawProcess {
        match self.process(key, self.cur_priority.get(key)) {
            Some(proc) => proc,
            None => runtime_error!(RuntimeError::PriorityConflict),
        }
    }

    #[inline(always)]
    pub(crate) fn ready_insert(&self, key: InterruptLockKey<'_>, tag: ProcessMap) {
        self.ready_map.set(key, self.ready_map.get(key).union(tag));
    }

    #[inline(always)]
    pub(crate) fn ready_remove(&self, key: InterruptLockKey<'_>, tag: ProcessMap) {
        self.ready_map.set(key, self.ready_map.get(key).without(tag));
    }

    #[inline(always)]
    pub(crate) fn ready_contains(&self, key: InterruptLockKey<'_>, tag: ProcessMap) -> bool {
        self.ready_map.get(key).contains(tag)
    }

    #[inline(always)]
    pub(crate) fn in_isr(&self, key: InterruptLockKey<'_>) -> bool {
        self.isr_nest_count.get(key) != 0
    }

    pub(crate) fn isr_enter(&self, key: InterruptLockKey<'_>) {
        self.isr_nest_count.set(key, self.isr_nest_count.get(key) + 1);
    }

    /// Returns true when the outermost ISR is exiting.
    pub(crate) fn isr_exit(&self, key: InterruptLockKey<'_>) -> bool {
        let nest = self.isr_nest_count.get(key) - 1;
        self.isr_nest_count.set(key, nest);
        nest == 0
    }

    /// Scheduler entry gate. ISRs never switch from here; the ISR exit
    /// guard reschedules once the outermost handler unwinds.
    pub(crate) fn scheduler(&self, key: InterruptLockKey<'_>) {
        if self.in_isr(key) {
            return;
        }
        self.sched(key);
    }

    /// Direct scheme: pick the highest ready priority and switch to it
    /// inline. Runs under the caller's critical section; returns once this
    /// process is switched back in.
    #[cfg(not(feature = "deferred-switch"))]
    pub(crate) fn sched(&self, key: InterruptLockKey<'_>) {
        let next = self.ready_map.get(key).highest_priority();
        let cur = self.cur_priority.get(key);
        if next == cur {
            return;
        }

        #[cfg(feature = "context-switch-hook")]
        unsafe {
            _kestrel_context_switch_hook()
        };

        let cur_proc = self.cur_proc(key);
        if !cur_proc.stack_alive() {
            runtime_error!(RuntimeError::StackOverflow);
        }
        let next_ctx = match self.process(key, next) {
            Some(proc) => proc.context_ptr(),
            None => runtime_error!(RuntimeError::PriorityConflict),
        };

        self.cur_priority.set(key, next);
        unsafe { khal::switch_context(cur_proc.context_ptr(), next_ctx) };
    }

    /// Deferred scheme: pend the context-switch trap and spin-release the
    /// interrupt mask until the trap has performed the switch.
    #[cfg(feature = "deferred-switch")]
    pub(crate) fn sched(&self, key: InterruptLockKey<'_>) {
        let next = self.ready_map.get(key).highest_priority();
        if next == self.cur_priority.get(key) {
            return;
        }

        self.sched_priority.set(key, next);
        khal::raise_context_switch();

        loop {
            khal::restore(true);
            khal::context_switch_window();
            let _ = khal::acquire();
            if self.cur_priority.get(key) == self.sched_priority.get(key) {
                break;
            }
        }
    }

    /// ISR-side scheduler, invoked when the outermost ISR exits.
    pub(crate) fn sched_isr(&self, key: InterruptLockKey<'_>) {
        #[cfg(feature = "deferred-switch")]
        {
            let next = self.ready_map.get(key).highest_priority();
            if next != self.cur_priority.get(key) {
                self.sched_priority.set(key, next);
                khal::raise_context_switch();
            }
        }
        #[cfg(not(feature = "deferred-switch"))]
        {
            // Direct scheme: the switch happens right here, standing in for
            // the port's ISR-exit wrapper.
            self.sched(key);
        }
    }

    /// System tick: advance the tick counter and the timeout sweep. Runs in
    /// interrupt context.
    pub(crate) fn system_tick(&self, key: InterruptLockKey<'_>) {
        #[cfg(feature = "system-ticks")]
        self.tick_count
            .set(key, self.tick_count.get(key).wrapping_add(1));

        #[cfg(feature = "systimer-hook")]
        unsafe {
            _kestrel_systimer_hook()
        };

        for priority in 0..LAST_PRIORITY {
            if let Some(proc) = self.process(key, priority) {
                let timeout = proc.timeout_get(key);
                if timeout > 0 {
                    let timeout = timeout - 1;
                    proc.timeout_set(key, timeout);
                    if timeout == 0 {
                        self.ready_insert(key, proc.tag());
                    }
                }
            }
        }
    }

    #[cfg(feature = "system-ticks")]
    pub(crate) fn tick_count(&self, key: InterruptLockKey<'_>) -> TimeoutCount {
        self.tick_count.get(key)
    }

    /// Put the current process to sleep. A zero timeout sleeps without a
    /// deadline; only `wake_up`/`force_wake_up` ends such a sleep.
    pub(crate) fn sleep(&self, key: InterruptLockKey<'_>, timeout: TimeoutCount) {
        if self.in_isr(key) {
            runtime_error!(RuntimeError::InterruptHandlerViolation);
        }
        let cur = self.cur_proc(key);
        cur.timeout_set(key, timeout);
        self.ready_remove(key, cur.tag());
        self.sched(key);
    }

    /// Block the current process on a service waiter map. On return the
    /// process has been resumed — by the service, by its timeout, or by a
    /// forced wake; `is_timeouted` distinguishes the cases.
    pub(crate) fn suspend_cur(&self, key: InterruptLockKey<'_>, waiters: &WaiterMap) {
        if self.in_isr(key) {
            runtime_error!(RuntimeError::InterruptHandlerViolation);
        }
        let cur = self.cur_proc(key);
        waiters.insert(key, cur.tag());
        self.ready_remove(key, cur.tag());
        cur.set_waiting_in(key, waiters as *const WaiterMap);
        self.sched(key);
        cur.set_waiting_in(key, core::ptr::null());
    }

    /// Ready every waiter and reschedule. Returns false if there was no
    /// waiter.
    pub(crate) fn resume_all(&self, key: InterruptLockKey<'_>, waiters: &WaiterMap) -> bool {
        if !self.resume_all_isr(key, waiters) {
            return false;
        }
        self.scheduler(key);
        true
    }

    /// Ready the highest-priority waiter and reschedule. Returns the
    /// resumed process's tag, or the empty map.
    pub(crate) fn resume_next_ready(
        &self,
        key: InterruptLockKey<'_>,
        waiters: &WaiterMap,
    ) -> ProcessMap {
        let tag = self.resume_next_ready_isr(key, waiters);
        if !tag.is_empty() {
            self.scheduler(key);
        }
        tag
    }

    /// As `resume_all`, without invoking the scheduler; the ISR exit guard
    /// reschedules instead.
    pub(crate) fn resume_all_isr(&self, key: InterruptLockKey<'_>, waiters: &WaiterMap) -> bool {
        let map = waiters.take(key);
        if map.is_empty() {
            return false;
        }
        self.ready_insert(key, map);
        true
    }

    /// As `resume_next_ready`, without invoking the scheduler.
    pub(crate) fn resume_next_ready_isr(
        &self,
        key: InterruptLockKey<'_>,
        waiters: &WaiterMap,
    ) -> ProcessMap {
        let map = waiters.get(key);
        if map.is_empty() {
            return ProcessMap::EMPTY;
        }
        let tag = map.highest_tag();
        waiters.set(key, map.without(tag));
        self.ready_insert(key, tag);
        tag
    }

    /// True iff the calling process's tag is still in `waiters`: its
    /// resumption was a timeout or a forced wake, not a service resume.
    pub(crate) fn is_timeouted(&self, key: InterruptLockKey<'_>, waiters: &WaiterMap) -> bool {
        waiters.contains(key, self.cur_proc(key).tag())
    }
}

/// Context-switch trap hook (deferred scheme): commit the pending priority
/// and hand the port the context to restore. Making the priority update and
/// the stack swap one indivisible action is what keeps a nested scheduler
/// call from observing a half-switched kernel.
pub(crate) fn context_switch_hook(cur: *mut Context) -> *const Context {
    #[cfg(feature = "deferred-switch")]
    {
        let _ = cur;
        // The trap runs with interrupts masked.
        let key = unsafe { InterruptLockKey::new() };
        let k = kernel();

        #[cfg(feature = "context-switch-hook")]
        unsafe {
            _kestrel_context_switch_hook()
        };

        let cur_proc = k.cur_proc(key);
        if !cur_proc.stack_alive() {
            runtime_error!(RuntimeError::StackOverflow);
        }

        let next = k.sched_priority.get(key);
        k.cur_priority.set(key, next);
        match k.process(key, next) {
            Some(proc) => proc.context_ptr() as *const Context,
            None => runtime_error!(RuntimeError::PriorityConflict),
        }
    }
    #[cfg(not(feature = "deferred-switch"))]
    {
        cur as *const Context
    }
}

/// Start the kernel: initialize the port, bring up the idle process, and
/// transfer control to the process at priority 0. Never returns.
pub(crate) fn run() -> ! {
    unsafe { khal::init() };
    crate::kernel::idle::init_idle_process();

    let first = InterruptLock::with(|key| match kernel().process(key, 0) {
        Some(proc) => proc.context_ptr(),
        None => runtime_error!(RuntimeError::PriorityConflict),
    });

    let _ = khal::acquire();
    khal::start_first(first)
}

/// Diagnostic dump of the process table.
pub fn print_processes() {
    printkln!("PRI NAME             STATE");
    InterruptLock::with(|key| {
        let k = kernel();
        for priority in 0..PROCESS_COUNT as ProcessPriority {
            if let Some(proc) = k.process(key, priority) {
                let state = if k.cur_priority(key) == priority {
                    "exec"
                } else if k.ready_contains(key, proc.tag()) {
                    "ready"
                } else if proc.timeout_get(key) > 0 {
                    "sleep"
                } else {
                    "susp"
                };
                printkln!("{:<3} {:<16} {}", priority, proc.name(), state);
            }
        }
    });
}
