//! Interrupt service routine entry/exit guard.
//!
//! Hardware ports wrap their ISR bodies in an [`IsrGuard`]; a port wrapper
//! may additionally switch the CPU to a dedicated interrupt stack on entry
//! and restore it on exit, or re-enable higher-priority interrupts across
//! the handler where the hardware supports nesting. Both are port-side
//! concerns; the guard only tracks nesting and triggers the ISR-side
//! scheduler at outermost exit.

use crate::kernel::scheduler::kernel;
use crate::sync::interrupt_lock::InterruptLock;

/// Scoped ISR nesting marker.
///
/// Construction enters interrupt context; when the guard of the outermost
/// handler drops, the ISR-side scheduler runs so that a handler which
/// readied a higher-priority process causes a switch at interrupt return.
pub struct IsrGuard(());

impl IsrGuard {
    pub fn enter() -> IsrGuard {
        InterruptLock::with(|key| kernel().isr_enter(key));
        IsrGuard(())
    }
}

impl Drop for IsrGuard {
    fn drop(&mut self) {
        InterruptLock::with(|key| {
            if kernel().isr_exit(key) {
                kernel().sched_isr(key);
            }
        })
    }
}

/// System timer interrupt body. Port timer ISRs call this.
pub fn tick_isr() {
    let _guard = IsrGuard::enter();
    InterruptLock::with(|key| kernel().system_tick(key));
}
