//! The kernel agent: the one gateway through which IPC services reach
//! kernel-private state.
//!
//! Services own their waiter maps and service-specific state; everything
//! that touches the ready set, the current process, or timeouts goes
//! through this facade. Every operation demands an [`InterruptLockKey`],
//! so the critical-section discipline is enforced at the type level.

use crate::kernel::priority::{ProcessMap, TimeoutCount};
use crate::kernel::scheduler::kernel;
use crate::kernel::waiter::WaiterMap;
use crate::sync::interrupt_lock::InterruptLockKey;

pub(crate) struct KernelAgent;

impl KernelAgent {
    /// Tag of the running process.
    #[inline(always)]
    pub(crate) fn cur_proc_tag(key: InterruptLockKey<'_>) -> ProcessMap {
        kernel().cur_proc(key).tag()
    }

    /// Arm the running process's wait deadline. Zero means no deadline.
    #[inline(always)]
    pub(crate) fn set_cur_timeout(key: InterruptLockKey<'_>, timeout: TimeoutCount) {
        kernel().cur_proc(key).timeout_set(key, timeout);
    }

    /// Disarm the running process's wait deadline after a service resume.
    #[inline(always)]
    pub(crate) fn clear_cur_timeout(key: InterruptLockKey<'_>) {
        kernel().cur_proc(key).timeout_set(key, 0);
    }

    /// Block the running process on `waiters`. Returns after resumption.
    #[inline(always)]
    pub(crate) fn suspend(key: InterruptLockKey<'_>, waiters: &WaiterMap) {
        kernel().suspend_cur(key, waiters);
    }

    /// After resumption: true iff the wait ended by timeout or forced wake
    /// rather than a service resume. The caller clears its own bit with
    /// [`KernelAgent::clear_timeouted`] before acting on the result.
    #[inline(always)]
    pub(crate) fn is_timeouted(key: InterruptLockKey<'_>, waiters: &WaiterMap) -> bool {
        kernel().is_timeouted(key, waiters)
    }

    #[inline(always)]
    pub(crate) fn clear_timeouted(key: InterruptLockKey<'_>, waiters: &WaiterMap) {
        waiters.remove(key, Self::cur_proc_tag(key));
    }

    /// Ready every waiter; false if the map was empty.
    #[inline(always)]
    pub(crate) fn resume_all(key: InterruptLockKey<'_>, waiters: &WaiterMap) -> bool {
        kernel().resume_all(key, waiters)
    }

    /// Ready the highest-priority waiter; returns its tag, or the empty
    /// map if no process was waiting.
    #[inline(always)]
    pub(crate) fn resume_next_ready(key: InterruptLockKey<'_>, waiters: &WaiterMap) -> ProcessMap {
        kernel().resume_next_ready(key, waiters)
    }

    /// Invoke the scheduler (no-op inside an ISR). For services that must
    /// update their own state between readying a waiter and the switch.
    #[inline(always)]
    pub(crate) fn reschedule(key: InterruptLockKey<'_>) {
        kernel().scheduler(key);
    }

    #[inline(always)]
    pub(crate) fn resume_all_isr(key: InterruptLockKey<'_>, waiters: &WaiterMap) -> bool {
        kernel().resume_all_isr(key, waiters)
    }

    #[inline(always)]
    pub(crate) fn resume_next_ready_isr(
        key: InterruptLockKey<'_>,
        waiters: &WaiterMap,
    ) -> ProcessMap {
        kernel().resume_next_ready_isr(key, waiters)
    }
}
