//! Hardware abstraction layer for the KESTREL kernel.
//!
//! This crate defines the traits a port must implement for the kernel to run
//! on a target. The kernel is written against these traits only; everything
//! target-specific — context save/restore, stack-frame initialization, the
//! interrupt mask, the software context-switch trap, the system timer — lives
//! in a port crate such as `kestrel-khal-sim`.
//!
//! # Key components
//!
//! - [`ProcessContext`]: the saved execution state of one process. On a
//!   hardware port this is typically just the saved stack pointer; the
//!   simulator port keeps a handle to a host thread instead.
//!
//! - [`FlowController`]: control transfer and interrupt masking. The kernel
//!   calls [`FlowController::switch_context`] from the scheduler in the
//!   direct switch scheme, and [`FlowController::raise_context_switch`] to
//!   pend the switch trap in the deferred scheme.
//!
//! - [`ConsoleController`]: byte sink for the kernel's `printk!` output.
//!
//! # Callbacks into the kernel
//!
//! The port calls back into the kernel through [`KernelCallbacks`], which
//! resolves to `extern "Rust"` symbols the kernel exports:
//!
//! - `kernel_tick_handler` — invoked from the system timer interrupt.
//! - `kernel_switch_handler` — invoked from the context-switch trap
//!   (deferred scheme); receives the outgoing context and returns the
//!   context to restore.
//! - `kernel_process_exit_handler` — invoked if a process entry function
//!   returns, which is a misuse the kernel reports and aborts on.
//!
//! # Interrupt masking contract
//!
//! [`FlowController::acquire`] disables interrupts globally and returns the
//! previous enable state; [`FlowController::restore`] re-enables them only if
//! the saved state says so. Nesting therefore composes without counters. A
//! pended context-switch trap must be taken while interrupts are enabled and
//! the trap gate ([`FlowController::enable_context_switch`]) is open; the
//! kernel's deferred scheduler relies on the trap firing inside the
//! enable window of its spin-release loop.

#![no_std]

pub use aligned::{A2, A4, A8, A16, Aligned, Alignment};

/// Saved execution state of one process between context switches.
pub trait ProcessContext {
    /// Top-of-stack pointer recorded for this context. Diagnostic only on
    /// ports that do not keep the frame on the process stack.
    fn stack_top_ptr(&self) -> *const u8;

    /// Initialize `context` so that the first switch into it enters
    /// `entry` with interrupts enabled, on the stack described by
    /// `stack_top`/`stack_size`.
    ///
    /// Re-initializing an already-initialized context must be supported;
    /// the kernel does this when a process is restarted.
    ///
    /// # Safety
    ///
    /// `context` must point to storage that stays valid and pinned for the
    /// lifetime of the process. `stack_top` must be the aligned top of a
    /// region of at least `stack_size` bytes owned exclusively by the
    /// process.
    unsafe fn init(
        name: &'static str,
        entry: fn(),
        stack_top: *mut u8,
        stack_size: usize,
        context: *mut Self,
    );
}

/// Control transfer, interrupt masking, and the remaining CPU-side
/// primitives the kernel consumes.
pub trait FlowController {
    type Context: ProcessContext;
    type StackAlignment: Alignment;

    /// One-time port initialization; called from `run()` before the first
    /// process is started.
    ///
    /// # Safety
    ///
    /// Must be called exactly once, before any other port operation.
    unsafe fn init();

    /// Restore `context` and transfer control into it. Called once at
    /// startup with the highest-priority process; never returns.
    fn start_first(context: *const Self::Context) -> !;

    /// Direct switch: save the calling process's state into `save`, then
    /// restore `next` and return into it. When the saved process is later
    /// switched back to, this call returns normally.
    ///
    /// # Safety
    ///
    /// Must be called with interrupts disabled. `save` must be the current
    /// process's context and `next` an initialized context of a process
    /// that is not running.
    unsafe fn switch_context(save: *mut Self::Context, next: *const Self::Context);

    /// Pend the software context-switch trap (deferred scheme). The trap
    /// runs `kernel_switch_handler` once interrupts are enabled and the
    /// trap gate is open.
    fn raise_context_switch();

    /// Open the context-switch trap gate.
    fn enable_context_switch();

    /// Close the context-switch trap gate. A raised trap stays pending.
    fn disable_context_switch();

    /// Execute one architectural no-op so that a pended trap is actually
    /// taken while interrupts are enabled. Used inside the deferred
    /// scheduler's spin-release loop.
    fn context_switch_window();

    /// Disable interrupts globally; returns the previous enable state.
    fn acquire() -> bool;

    /// Restore the interrupt enable state saved by [`Self::acquire`].
    /// Re-disabling is a no-op if interrupts were already disabled.
    fn restore(state: bool);

    /// Current global interrupt enable state.
    fn interrupt_status() -> bool;

    /// Stop the system timer from delivering ticks.
    fn lock_system_timer();

    /// Resume system timer tick delivery.
    fn unlock_system_timer();

    /// Free-running cycle counter for run-time accounting.
    fn cycle_count() -> u32;

    /// Called by the kernel idle process on every idle iteration. Ports use
    /// this for `wfi` or, in the simulator, to yield the host CPU.
    fn on_idle();

    /// Abort execution after an unrecoverable kernel error.
    fn on_abort() -> !;
}

/// Byte sink for kernel console output.
pub trait ConsoleController {
    fn write_str(s: &str);
}

mod private {
    unsafe extern "Rust" {
        pub unsafe fn _private_kestrel_tick_handler();

        pub unsafe fn _private_kestrel_switch_handler(cur: *mut ()) -> *mut ();

        pub unsafe fn _private_kestrel_process_exit_handler() -> !;
    }
}

/// Entry points from the port into the kernel.
pub trait KernelCallbacks: FlowController {
    /// System timer tick. Call from the timer interrupt with interrupts
    /// disabled.
    ///
    /// # Safety
    ///
    /// Interrupt context only; interrupts must be masked.
    #[inline(always)]
    unsafe fn kernel_tick_handler() {
        unsafe { private::_private_kestrel_tick_handler() }
    }

    /// Context-switch trap body. Passes the outgoing context, receives the
    /// context to restore. The kernel updates its current-priority record
    /// inside this call, making the priority update and the context swap a
    /// single indivisible action.
    ///
    /// # Safety
    ///
    /// Trap context only; interrupts must be masked. `cur` must be the
    /// running process's context.
    #[inline(always)]
    unsafe fn kernel_switch_handler(cur: *mut Self::Context) -> *const Self::Context {
        unsafe { private::_private_kestrel_switch_handler(cur as *mut ()) as *const Self::Context }
    }

    /// A process entry function returned.
    ///
    /// # Safety
    ///
    /// Must be called on the offending process's own context.
    #[inline(always)]
    unsafe fn kernel_process_exit_handler() -> ! {
        unsafe { private::_private_kestrel_process_exit_handler() }
    }
}

impl<T> KernelCallbacks for T where T: FlowController {}
