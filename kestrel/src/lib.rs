//! KESTREL — a preemptive, priority-based real-time kernel for
//! single-chip microcontrollers.
//!
//! A fixed set of statically declared processes runs on one CPU under
//! strict priority scheduling: after every scheduling point the
//! highest-priority ready process is the one executing. Process readiness
//! and per-service waiter sets are bitmaps indexed by priority, so
//! selection is O(1). Control transfer is either an inline context switch
//! from the scheduler call site or, with the `deferred-switch` feature, a
//! pended software trap.
//!
//! Processes coordinate through the services in [`sync`]: a broadcast
//! [`EventFlag`](sync::EventFlag), an ownership-transferring
//! [`Mutex`](sync::Mutex), a typed [`Message`](sync::Message), and a typed
//! bounded [`Channel`](sync::Channel). Blocking calls accept a timeout in
//! system ticks; zero means no deadline.
//!
//! ```ignore
//! use kestrel::prelude::*;
//!
//! static STARTUP: EventFlag = EventFlag::new();
//!
//! fn control() {
//!     STARTUP.wait(0);
//!     loop { /* ... */ }
//! }
//!
//! fn main() -> ! {
//!     make_process!("control", 0, 4096, control);
//!     kestrel::run()
//! }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod api;
pub(crate) mod cell;
pub mod config;
pub mod kernel;
pub mod sync;

pub use api::*;
pub use kernel::isr::IsrGuard;
pub use kernel::priority::{ProcessMap, ProcessPriority, TimeoutCount};
pub use kernel::process::{Process, ProcessRef};
pub use kernel::profiler::Profiler;
pub use kernel::scheduler::print_processes;

pub mod prelude {
    pub use crate::kernel::priority::{ProcessPriority, TimeoutCount};
    pub use crate::kernel::process::{Process, ProcessRef};
    pub use crate::make_process;
    pub use crate::sync::{Channel, EventFlag, Message, Mutex, RawMutex};
}
