//! A signal from a low-priority process immediately resumes the
//! high-priority waiter; a sleeping mid-priority process stays suspended.

use kestrel::prelude::*;
use kestrel_test as ktest;
use std::time::Duration;

const STACK_SIZE: usize = 16 * 1024;

static FLAG: EventFlag = EventFlag::new();

fn high() {
    ktest::report("high:wait");
    assert!(FLAG.wait(0));
    ktest::report("high:flagged");
    loop {
        kestrel::sleep(0);
    }
}

fn mid() {
    ktest::report("mid:sleep");
    loop {
        kestrel::sleep(0);
    }
}

fn low() {
    ktest::report("low:signal");
    FLAG.signal();
    ktest::report("low:after");
    ktest::complete();
    loop {
        kestrel::sleep(0);
    }
}

#[test]
fn signal_preempts_into_high_priority_waiter() {
    ktest::launch(|| {
        make_process!("high", 0, STACK_SIZE, high);
        make_process!("mid", 1, STACK_SIZE, mid);
        make_process!("low", 2, STACK_SIZE, low);
        kestrel::run()
    });

    ktest::expect_events(
        Duration::from_secs(10),
        &[
            "high:wait",
            "mid:sleep",
            "low:signal",
            "high:flagged",
            "low:after",
        ],
    );
}
