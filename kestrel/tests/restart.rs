//! terminate() rewinds a process to its entry function and removes it from
//! the waiter map it was blocked in; start() relaunches it.

#![cfg(feature = "restart")]

use kestrel::prelude::*;
use kestrel_test as ktest;
use std::time::Duration;

const STACK_SIZE: usize = 16 * 1024;

static FLAG: EventFlag = EventFlag::new();

fn p0() {
    ktest::report("p0:start");
    assert!(FLAG.wait(0));
    ktest::report("p0:flagged");
    loop {
        kestrel::sleep(0);
    }
}

fn p1() {
    let p0 = kestrel::get_proc(0).unwrap();

    // p0 is blocked in FLAG's waiter set right now.
    p0.terminate();
    assert!(p0.is_suspended());
    ktest::report("p1:killed");

    // Restart runs the entry function from scratch.
    p0.start();
    ktest::report("p1:restarted");

    // Had terminate left a stale tag behind, this signal would resume a
    // ghost; instead it reaches the restarted wait.
    FLAG.signal();
    ktest::complete();
    loop {
        kestrel::sleep(0);
    }
}

#[test]
fn terminate_and_restart_rewind_the_process() {
    ktest::launch(|| {
        make_process!("p0", 0, STACK_SIZE, p0);
        make_process!("p1", 1, STACK_SIZE, p1);
        kestrel::run()
    });

    ktest::expect_events(
        Duration::from_secs(10),
        &["p0:start", "p1:killed", "p0:start", "p1:restarted", "p0:flagged"],
    );
}
