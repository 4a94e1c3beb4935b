//! Hosted simulator port for the KESTREL kernel.
//!
//! Each RTOS process is backed by a host OS thread that is suspended and
//! resumed through a resumed-flag + condvar pair. Exactly one process thread
//! is unparked at any time, which gives the kernel its single-CPU execution
//! model on the host.
//!
//! Interrupts are virtual. A timer thread accumulates pending tick
//! interrupts; pending interrupts are delivered synchronously on the current
//! process's thread at the points where a real CPU would take them — when the
//! interrupt enable state transitions to enabled, inside the deferred
//! scheduler's release window, and in the idle loop. This keeps test runs
//! deterministic: no interrupt ever fires in the middle of a critical
//! section.
//!
//! The context-switch trap of the deferred scheme is modeled the same way:
//! [`FlowController::raise_context_switch`] marks the trap pending, and the
//! next delivery point runs the kernel's switch handler and performs the
//! thread handover.

use const_env::from_env;
use kestrel_khal::{A16, ConsoleController, FlowController, KernelCallbacks, ProcessContext};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicU32, Ordering};
use std::sync::{Condvar, Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Virtual system timer period in host microseconds.
#[from_env]
const KESTREL_SIM_TICK_US: u64 = 1000;

/// Host threads need far more stack than a microcontroller process; the
/// configured RTOS stack size is only a lower bound here.
const MIN_HOST_STACK: usize = 512 * 1024;

static CURRENT: AtomicPtr<SimContext> = AtomicPtr::new(core::ptr::null_mut());
static INTERRUPTS_ENABLED: AtomicBool = AtomicBool::new(false);
static PENDING_TICKS: AtomicU32 = AtomicU32::new(0);
static TRAP_PENDING: AtomicBool = AtomicBool::new(false);
static SWITCH_GATE: AtomicBool = AtomicBool::new(true);
static TIMER_LOCKED: AtomicBool = AtomicBool::new(false);
static EPOCH: OnceLock<Instant> = OnceLock::new();

std::thread_local! {
    // Guards against re-entering interrupt delivery on the same thread
    // while a delivered handler toggles the interrupt enable state.
    static IN_DELIVERY: Cell<bool> = const { Cell::new(false) };
}

struct Parker {
    resumed: Mutex<bool>,
    cond: Condvar,
}

impl Parker {
    fn new() -> Parker {
        Parker {
            resumed: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn suspend(&self) {
        let mut resumed = self.resumed.lock().unwrap();
        while !*resumed {
            resumed = self.cond.wait(resumed).unwrap();
        }
        *resumed = false;
    }

    fn resume(&self) {
        let mut resumed = self.resumed.lock().unwrap();
        *resumed = true;
        self.cond.notify_one();
    }
}

struct SimInner {
    name: &'static str,
    entry: fn(),
    parker: Parker,
    stack_top: AtomicPtr<u8>,
}

/// Simulator process context: a handle to the host thread backing the
/// process.
///
/// Restarting a process re-initializes the context in place; the previous
/// inner state is leaked so that the abandoned host thread, parked forever,
/// keeps referencing valid memory.
pub struct SimContext {
    inner: AtomicPtr<SimInner>,
}

impl SimContext {
    fn inner(&self) -> &'static SimInner {
        unsafe { &*self.inner.load(Ordering::SeqCst) }
    }
}

impl ProcessContext for SimContext {
    fn stack_top_ptr(&self) -> *const u8 {
        self.inner().stack_top.load(Ordering::SeqCst)
    }

    unsafe fn init(
        name: &'static str,
        entry: fn(),
        stack_top: *mut u8,
        stack_size: usize,
        context: *mut Self,
    ) {
        let inner: &'static SimInner = Box::leak(Box::new(SimInner {
            name,
            entry,
            parker: Parker::new(),
            stack_top: AtomicPtr::new(stack_top),
        }));

        // Plain write: valid both for the first initialization of the
        // uninitialized context storage and for re-initialization on
        // process restart (AtomicPtr has no drop glue).
        unsafe {
            context.write(SimContext {
                inner: AtomicPtr::new(inner as *const SimInner as *mut SimInner),
            });
        }

        let inner_addr = inner as *const SimInner as usize;
        std::thread::Builder::new()
            .name(name.to_string())
            .stack_size(stack_size.max(MIN_HOST_STACK))
            .spawn(move || process_thread_main(inner_addr))
            .expect("simulator: failed to spawn process thread");
    }
}

// Waits for the first dispatch before entering the process entry function,
// so that a process never runs ahead of the scheduler. The first restore is
// a synthetic interrupt return: interrupts come up enabled.
fn process_thread_main(inner_addr: usize) {
    let inner = unsafe { &*(inner_addr as *const SimInner) };
    inner.parker.suspend();

    INTERRUPTS_ENABLED.store(true, Ordering::SeqCst);
    deliver_pending();

    (inner.entry)();

    unsafe { Simulator::kernel_process_exit_handler() }
}

fn timer_thread_main() {
    let period = Duration::from_micros(KESTREL_SIM_TICK_US);
    loop {
        std::thread::sleep(period);
        if !TIMER_LOCKED.load(Ordering::SeqCst) {
            PENDING_TICKS.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// Take all deliverable virtual interrupts on the calling thread. Tick
// interrupts outrank the context-switch trap, which is the lowest-priority
// interrupt on every real target.
fn deliver_pending() {
    if !INTERRUPTS_ENABLED.load(Ordering::SeqCst) {
        return;
    }
    if IN_DELIVERY.with(|flag| flag.replace(true)) {
        return;
    }

    loop {
        if PENDING_TICKS.load(Ordering::SeqCst) > 0 {
            PENDING_TICKS.fetch_sub(1, Ordering::SeqCst);
            let saved = INTERRUPTS_ENABLED.swap(false, Ordering::SeqCst);
            unsafe { Simulator::kernel_tick_handler() };
            INTERRUPTS_ENABLED.store(saved, Ordering::SeqCst);
            continue;
        }

        if TRAP_PENDING.load(Ordering::SeqCst) && SWITCH_GATE.load(Ordering::SeqCst) {
            TRAP_PENDING.store(false, Ordering::SeqCst);
            let saved = INTERRUPTS_ENABLED.swap(false, Ordering::SeqCst);
            take_context_switch_trap();
            INTERRUPTS_ENABLED.store(saved, Ordering::SeqCst);
            continue;
        }

        break;
    }

    IN_DELIVERY.with(|flag| flag.set(false));
}

fn take_context_switch_trap() {
    let cur = CURRENT.load(Ordering::SeqCst);
    let next = unsafe { Simulator::kernel_switch_handler(cur) };
    if next != cur as *const SimContext {
        CURRENT.store(next as *mut SimContext, Ordering::SeqCst);
        unsafe { (*next).inner() }.parker.resume();
        unsafe { (*cur).inner() }.parker.suspend();
        // Resumed again: this thread is the current process once more.
    }
}

pub struct Simulator;

pub type Khal = Simulator;

impl FlowController for Simulator {
    type Context = SimContext;
    type StackAlignment = A16;

    unsafe fn init() {
        let _ = EPOCH.get_or_init(Instant::now);
        std::thread::Builder::new()
            .name("kestrel-sim-tick".to_string())
            .spawn(timer_thread_main)
            .expect("simulator: failed to spawn timer thread");
    }

    fn start_first(context: *const SimContext) -> ! {
        CURRENT.store(context as *mut SimContext, Ordering::SeqCst);
        unsafe { &*context }.inner().parker.resume();

        // The boot thread is not a process; it stays out of the way for the
        // lifetime of the program.
        loop {
            std::thread::park();
        }
    }

    unsafe fn switch_context(save: *mut SimContext, next: *const SimContext) {
        CURRENT.store(next as *mut SimContext, Ordering::SeqCst);
        unsafe { &*next }.inner().parker.resume();
        unsafe { &*save }.inner().parker.suspend();
        // Resumed: control returned to the saved process.
    }

    fn raise_context_switch() {
        TRAP_PENDING.store(true, Ordering::SeqCst);
    }

    fn enable_context_switch() {
        SWITCH_GATE.store(true, Ordering::SeqCst);
        deliver_pending();
    }

    fn disable_context_switch() {
        SWITCH_GATE.store(false, Ordering::SeqCst);
    }

    fn context_switch_window() {
        deliver_pending();
    }

    fn acquire() -> bool {
        INTERRUPTS_ENABLED.swap(false, Ordering::SeqCst)
    }

    fn restore(state: bool) {
        if state {
            INTERRUPTS_ENABLED.store(true, Ordering::SeqCst);
            deliver_pending();
        }
    }

    fn interrupt_status() -> bool {
        INTERRUPTS_ENABLED.load(Ordering::SeqCst)
    }

    fn lock_system_timer() {
        TIMER_LOCKED.store(true, Ordering::SeqCst);
    }

    fn unlock_system_timer() {
        TIMER_LOCKED.store(false, Ordering::SeqCst);
    }

    fn cycle_count() -> u32 {
        match EPOCH.get() {
            Some(epoch) => epoch.elapsed().as_micros() as u32,
            None => 0,
        }
    }

    fn on_idle() {
        deliver_pending();
        std::thread::sleep(Duration::from_micros(KESTREL_SIM_TICK_US / 4));
    }

    fn on_abort() -> ! {
        std::process::abort()
    }
}

impl ConsoleController for Simulator {
    fn write_str(s: &str) {
        eprint!("{}", s);
    }
}
