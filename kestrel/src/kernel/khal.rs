//! Port binding: feature-selected KHAL implementation plus the kernel-side
//! callback symbols the port links against.

use kestrel_khal::{ConsoleController, FlowController, ProcessContext};

#[cfg(feature = "khal-sim")]
pub(crate) use kestrel_khal_sim as khal_impl;

#[cfg(not(any(feature = "khal-sim")))]
compile_error!(
    "no KHAL port selected; enable one of the `khal-*` features of the kestrel crate"
);

pub(crate) type Khal = khal_impl::Khal;

/// The port-defined saved execution state of a process.
pub type Context = <Khal as FlowController>::Context;

pub(crate) type StackAlignment = <Khal as FlowController>::StackAlignment;

#[inline(always)]
pub(crate) unsafe fn init() {
    unsafe { <Khal as FlowController>::init() }
}

#[inline(always)]
pub(crate) fn start_first(context: *const Context) -> ! {
    <Khal as FlowController>::start_first(context)
}

#[allow(dead_code)]
#[inline(always)]
pub(crate) unsafe fn switch_context(save: *mut Context, next: *const Context) {
    unsafe { <Khal as FlowController>::switch_context(save, next) }
}

#[allow(dead_code)]
#[inline(always)]
pub(crate) fn raise_context_switch() {
    <Khal as FlowController>::raise_context_switch()
}

#[allow(dead_code)]
#[inline(always)]
pub(crate) fn enable_context_switch() {
    <Khal as FlowController>::enable_context_switch()
}

#[allow(dead_code)]
#[inline(always)]
pub(crate) fn disable_context_switch() {
    <Khal as FlowController>::disable_context_switch()
}

#[allow(dead_code)]
#[inline(always)]
pub(crate) fn context_switch_window() {
    <Khal as FlowController>::context_switch_window()
}

#[inline(always)]
pub(crate) fn acquire() -> bool {
    <Khal as FlowController>::acquire()
}

#[inline(always)]
pub(crate) fn restore(state: bool) {
    <Khal as FlowController>::restore(state)
}

#[allow(dead_code)]
#[inline(always)]
pub(crate) fn interrupt_status() -> bool {
    <Khal as FlowController>::interrupt_status()
}

#[inline(always)]
pub(crate) fn lock_system_timer() {
    <Khal as FlowController>::lock_system_timer()
}

#[inline(always)]
pub(crate) fn unlock_system_timer() {
    <Khal as FlowController>::unlock_system_timer()
}

#[allow(dead_code)]
#[inline(always)]
pub(crate) fn cycle_count() -> u32 {
    <Khal as FlowController>::cycle_count()
}

#[inline(always)]
pub(crate) fn on_idle() {
    <Khal as FlowController>::on_idle()
}

#[inline(always)]
pub(crate) fn on_abort() -> ! {
    <Khal as FlowController>::on_abort()
}

#[inline(always)]
pub(crate) fn console_write(s: &str) {
    <Khal as ConsoleController>::write_str(s)
}

#[allow(dead_code)]
#[inline(always)]
pub(crate) unsafe fn init_context(
    name: &'static str,
    entry: fn(),
    stack_top: *mut u8,
    stack_size: usize,
    context: *mut Context,
) {
    unsafe { Context::init(name, entry, stack_top, stack_size, context) }
}

// Kernel-side definitions of the `extern "Rust"` callback symbols declared
// by kestrel-khal.

#[unsafe(no_mangle)]
unsafe extern "Rust" fn _private_kestrel_tick_handler() {
    crate::kernel::isr::tick_isr();
}

#[unsafe(no_mangle)]
unsafe extern "Rust" fn _private_kestrel_switch_handler(cur: *mut ()) -> *mut () {
    crate::kernel::scheduler::context_switch_hook(cur as *mut Context) as *mut ()
}

#[unsafe(no_mangle)]
unsafe extern "Rust" fn _private_kestrel_process_exit_handler() -> ! {
    crate::runtime_error!(crate::kernel::exception::RuntimeError::ProcessExited)
}
