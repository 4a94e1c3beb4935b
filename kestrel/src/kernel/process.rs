//! The process model: control block, typed stack facet, and the public
//! process handle.
//!
//! A process is an independent execution context with its own statically
//! allocated stack and a unique, immutable priority. Processes are declared
//! as statics (usually through [`make_process!`](crate::make_process)) and
//! registered with the kernel by [`Process::init`] before `run()` is
//! entered. Processes are never destroyed; with the `restart` feature a
//! process can be terminated and started again from its entry function.

use crate::cell::LockedCell;
use crate::kernel::khal::{self, Context};
use crate::kernel::priority::{ProcessMap, ProcessPriority, TimeoutCount};
use crate::kernel::scheduler::kernel;
use crate::kernel::stack::{Stack, StackRefMut};
use crate::kernel::waiter::WaiterMap;
use crate::sync::interrupt_lock::{InterruptLock, InterruptLockKey};
use core::cell::UnsafeCell;
use core::mem::MaybeUninit;

/// Process control block.
pub(crate) struct RawProcess {
    name: &'static str,
    priority: ProcessPriority,
    entry: fn(),
    start_suspended: bool,

    // Non-zero while the process is blocked with a deadline; decremented by
    // the system tick, which readies the process when it reaches zero.
    timeout: LockedCell<TimeoutCount>,

    // The waiter map this process is currently a member of; null when not
    // blocked on a service. Lets terminate() and force_wake_up() drop the
    // membership without a stale tag surviving in the service.
    waiting_in: LockedCell<*const WaiterMap>,

    context: UnsafeCell<MaybeUninit<Context>>,
    stack: UnsafeCell<MaybeUninit<StackRefMut>>,
}

// All mutable state is behind key-gated cells or touched only under the
// critical section discipline documented on the kernel.
unsafe impl Sync for RawProcess {}

impl RawProcess {
    const fn new(
        name: &'static str,
        priority: ProcessPriority,
        entry: fn(),
        start_suspended: bool,
    ) -> RawProcess {
        RawProcess {
            name,
            priority,
            entry,
            start_suspended,
            timeout: LockedCell::new(0),
            waiting_in: LockedCell::new(core::ptr::null()),
            context: UnsafeCell::new(MaybeUninit::uninit()),
            stack: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    #[inline(always)]
    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    pub(crate) fn priority(&self) -> ProcessPriority {
        self.priority
    }

    #[inline(always)]
    pub(crate) fn tag(&self) -> ProcessMap {
        ProcessMap::tag(self.priority)
    }

    #[inline(always)]
    pub(crate) fn start_suspended(&self) -> bool {
        self.start_suspended
    }

    #[inline(always)]
    pub(crate) fn context_ptr(&self) -> *mut Context {
        self.context.get() as *mut Context
    }

    #[inline(always)]
    pub(crate) fn timeout_get(&self, key: InterruptLockKey<'_>) -> TimeoutCount {
        self.timeout.get(key)
    }

    #[inline(always)]
    pub(crate) fn timeout_set(&self, key: InterruptLockKey<'_>, timeout: TimeoutCount) {
        self.timeout.set(key, timeout)
    }

    #[inline(always)]
    pub(crate) fn set_waiting_in(&self, key: InterruptLockKey<'_>, map: *const WaiterMap) {
        self.waiting_in.set(key, map)
    }

    /// Remove this process's tag from the waiter map it is blocked on, if
    /// any, and forget the membership.
    pub(crate) fn clear_wait_membership(&self, key: InterruptLockKey<'_>) {
        let map = self.waiting_in.get(key);
        if !map.is_null() {
            unsafe { &*map }.remove(key, self.tag());
            self.waiting_in.set(key, core::ptr::null());
        }
    }

    /// Canary below the stack is intact. Valid only after `init`.
    pub(crate) fn stack_alive(&self) -> bool {
        unsafe { (*self.stack.get()).assume_init_ref() }.is_alive()
    }

    #[cfg(feature = "debug")]
    fn stack_slack(&self) -> usize {
        unsafe { (*self.stack.get()).assume_init_ref() }.slack()
    }

    /// Wake a process that is sleeping or waiting with a finite deadline.
    /// A process blocked without a deadline opted out of spurious wakes and
    /// is not affected.
    pub(crate) fn wake_up(&'static self) {
        InterruptLock::with(|key| {
            if self.timeout.get(key) > 0 {
                self.timeout.set(key, 0);
                let k = kernel();
                k.ready_insert(key, self.tag());
                k.scheduler(key);
            }
        })
    }

    /// Unconditionally make the process ready, dropping any service wait it
    /// is in the middle of.
    ///
    /// Dangerous: the service cannot tell a forced wake from its own
    /// resume, so the blocking call returns as if it succeeded. Intended
    /// for process startup and last-resort cancellation only.
    pub(crate) fn force_wake_up(&'static self) {
        InterruptLock::with(|key| {
            self.clear_wait_membership(key);
            self.timeout.set(key, 0);
            let k = kernel();
            k.ready_insert(key, self.tag());
            k.scheduler(key);
        })
    }

    pub(crate) fn is_sleeping(&self) -> bool {
        InterruptLock::with(|key| self.timeout.get(key) > 0)
    }

    pub(crate) fn is_suspended(&self) -> bool {
        InterruptLock::with(|key| {
            !kernel().ready_contains(key, self.tag()) && self.timeout.get(key) == 0
        })
    }

    /// Stop the process and rewind it to a fresh entry into its entry
    /// function. The process is left suspended; pair with `start()` to
    /// restart it.
    #[cfg(feature = "restart")]
    pub(crate) fn terminate(&'static self) {
        InterruptLock::with(|key| {
            let k = kernel();
            if k.cur_priority(key) == self.priority {
                crate::runtime_error!(crate::kernel::exception::RuntimeError::TerminateRunning);
            }
            self.clear_wait_membership(key);
            self.timeout.set(key, 0);
            k.ready_remove(key, self.tag());

            let stack = unsafe { (*self.stack.get()).assume_init_mut() };
            let top = stack.top_ptr();
            let size = stack.size();
            unsafe { khal::init_context(self.name, self.entry, top, size, self.context_ptr()) };
        })
    }
}

/// A process declaration: control block plus its typed stack storage.
pub struct Process<const STACK_SIZE: usize> {
    raw: RawProcess,
    stack: Stack<STACK_SIZE>,
}

impl<const STACK_SIZE: usize> Process<STACK_SIZE> {
    pub const fn new(
        name: &'static str,
        priority: ProcessPriority,
        entry: fn(),
    ) -> Process<STACK_SIZE> {
        Process {
            raw: RawProcess::new(name, priority, entry, false),
            stack: Stack::new(),
        }
    }

    /// Declare a process that does not become ready at registration.
    /// `start()` launches it later.
    pub const fn new_suspended(
        name: &'static str,
        priority: ProcessPriority,
        entry: fn(),
    ) -> Process<STACK_SIZE> {
        Process {
            raw: RawProcess::new(name, priority, entry, true),
            stack: Stack::new(),
        }
    }

    /// Take the stack, build the initial stack frame, and register with the
    /// kernel. Must be called exactly once, before `run()`.
    pub fn init(&'static self) -> ProcessRef {
        let mut stack = self.stack.init();
        let top = stack.top_ptr();
        let size = stack.size();
        unsafe {
            (*self.raw.stack.get()).write(stack);
            khal::init_context(self.raw.name, self.raw.entry, top, size, self.raw.context_ptr());
        }
        InterruptLock::with(|key| kernel().register(key, &self.raw));
        ProcessRef(&self.raw)
    }
}

/// Public handle to a registered process.
#[derive(Copy, Clone)]
pub struct ProcessRef(&'static RawProcess);

impl ProcessRef {
    pub(crate) fn new(raw: &'static RawProcess) -> ProcessRef {
        ProcessRef(raw)
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub fn priority(&self) -> ProcessPriority {
        self.0.priority()
    }

    /// See [`RawProcess::wake_up`]: wakes the process only out of a
    /// bounded wait or a sleep.
    pub fn wake_up(&self) {
        self.0.wake_up()
    }

    /// Unconditional wake. Breaks service wait invariants; see the module
    /// documentation before using this for anything but `start()`.
    pub fn force_wake_up(&self) {
        self.0.force_wake_up()
    }

    /// Launch a process declared with the start-suspended flag, or restart
    /// a terminated one.
    pub fn start(&self) {
        self.0.force_wake_up()
    }

    pub fn is_sleeping(&self) -> bool {
        self.0.is_sleeping()
    }

    pub fn is_suspended(&self) -> bool {
        self.0.is_suspended()
    }

    #[cfg(feature = "restart")]
    pub fn terminate(&self) {
        self.0.terminate()
    }

    /// Stack bytes never touched so far.
    #[cfg(feature = "debug")]
    pub fn stack_slack(&self) -> usize {
        self.0.stack_slack()
    }
}

/// Declare and register a process backed by a static stack of
/// `$stack_size` bytes.
///
/// ```ignore
/// fn control_loop() { /* ... */ }
/// let proc = make_process!("control", 1, 4096, control_loop);
/// ```
#[macro_export]
macro_rules! make_process {
    ($name:expr, $priority:expr, $stack_size:expr, $entry:expr) => {{
        static PROCESS: $crate::kernel::process::Process<{ $stack_size }> =
            $crate::kernel::process::Process::new($name, $priority, $entry);
        PROCESS.init()
    }};
    ($name:expr, $priority:expr, $stack_size:expr, $entry:expr, suspended) => {{
        static PROCESS: $crate::kernel::process::Process<{ $stack_size }> =
            $crate::kernel::process::Process::new_suspended($name, $priority, $entry);
        PROCESS.init()
    }};
}
