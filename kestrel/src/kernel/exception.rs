//! Kernel misuse reporting.
//!
//! The kernel has no recoverable errors: everything that can go wrong at
//! runtime is a programming error in a statically configured system.
//! Misuse is reported through [`runtime_error!`](crate::runtime_error),
//! which prints the error and its location and aborts through the port.

use crate::printkln;
use core::panic::Location;

#[macro_export]
macro_rules! runtime_error {
    ($kind:expr) => {
        $crate::kernel::exception::handle_runtime_error($kind, ::core::panic::Location::caller())
    };
}

#[derive(Debug)]
pub enum RuntimeError {
    /// A process entry function returned.
    ProcessExited,

    /// Two processes registered with the same priority, or `run()` found
    /// no process at priority 0.
    PriorityConflict,

    /// Attempt to unlock a mutex from a process that does not own it.
    MutexOwnerViolation,

    /// Blocking operation invoked from interrupt context.
    InterruptHandlerViolation,

    /// A process attempted to terminate itself.
    TerminateRunning,

    /// The canary below a process stack was overwritten.
    StackOverflow,
}

impl RuntimeError {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeError::ProcessExited => "ProcessExited",
            RuntimeError::PriorityConflict => "PriorityConflict",
            RuntimeError::MutexOwnerViolation => "MutexOwnerViolation",
            RuntimeError::InterruptHandlerViolation => "InterruptHandlerViolation",
            RuntimeError::TerminateRunning => "TerminateRunning",
            RuntimeError::StackOverflow => "StackOverflow",
        }
    }
}

#[track_caller]
pub fn handle_runtime_error(error: RuntimeError, location: &Location<'_>) -> ! {
    printkln!("kestrel: runtime error {} at {}", error.as_str(), location);
    crate::kernel::khal::on_abort()
}
