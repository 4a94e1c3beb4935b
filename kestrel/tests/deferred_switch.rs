//! Deferred switch scheme: voluntary switches go through the pended trap
//! and the spin-release loop; tick-driven wakes pend the trap from the ISR
//! exit path. Run with `--features deferred-switch`.

#![cfg(feature = "deferred-switch")]

use kestrel::prelude::*;
use kestrel_test as ktest;
use std::time::Duration;

const STACK_SIZE: usize = 16 * 1024;

static FLAG: EventFlag = EventFlag::new();

fn high() {
    ktest::report("high:wait");
    assert!(FLAG.wait(0));
    ktest::report("high:flagged");

    let before = kestrel::get_tick_count();
    kestrel::sleep(2);
    let slept = kestrel::get_tick_count().wrapping_sub(before);
    assert!((2..=7).contains(&slept), "slept {} ticks instead of 2", slept);
    ktest::report("high:woke");
    ktest::complete();
    loop {
        kestrel::sleep(0);
    }
}

fn low() {
    ktest::report("low:signal");
    FLAG.signal();
    loop {
        kestrel::sleep(0);
    }
}

#[test]
fn deferred_trap_performs_the_switch() {
    ktest::launch(|| {
        make_process!("high", 0, STACK_SIZE, high);
        make_process!("low", 1, STACK_SIZE, low);
        kestrel::run()
    });

    ktest::expect_events(
        Duration::from_secs(10),
        &["high:wait", "low:signal", "high:flagged", "high:woke"],
    );
}
