//! Build-time kernel configuration.
//!
//! Numeric constants are overridable through the environment at compile
//! time (`KESTREL_PROCESS_COUNT=12 cargo build ...`); boolean knobs are
//! Cargo features on this crate.

use const_env::from_env;

/// Total number of processes, including the mandatory idle process.
/// Priorities are `0..PROCESS_COUNT`, with `PROCESS_COUNT - 1` reserved for
/// idle.
#[from_env]
pub const KESTREL_PROCESS_COUNT: usize = 8;

/// Stack size of the kernel-owned idle process, in bytes.
#[from_env]
pub const KESTREL_IDLE_STACK_SIZE: usize = 16384;

pub const PROCESS_COUNT: usize = KESTREL_PROCESS_COUNT;
pub const IDLE_PROCESS_STACK_SIZE: usize = KESTREL_IDLE_STACK_SIZE;

const _: () = assert!(
    PROCESS_COUNT >= 2 && PROCESS_COUNT <= 32,
    "PROCESS_COUNT must be in 2..=32 (one application process plus idle, \
     up to the ready-map width)"
);
