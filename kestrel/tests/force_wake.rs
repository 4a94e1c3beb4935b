//! wake_up only ends bounded waits; force_wake_up ends anything.

use kestrel::prelude::*;
use kestrel_test as ktest;
use std::time::Duration;

const STACK_SIZE: usize = 16 * 1024;

fn p0() {
    ktest::report("p0:run");
    kestrel::sleep(0);
    ktest::report("p0:forced");
    ktest::complete();
    loop {
        kestrel::sleep(0);
    }
}

fn p1() {
    let p0 = kestrel::get_proc(0).unwrap();
    assert_eq!(p0.name(), "p0");
    assert_eq!(p0.priority(), 0);

    // Sleeping without a deadline is suspension, not a bounded sleep.
    assert!(p0.is_suspended());
    assert!(!p0.is_sleeping());

    // wake_up has no effect on a process without an armed timeout.
    p0.wake_up();
    assert!(p0.is_suspended());

    p0.force_wake_up();
    loop {
        kestrel::sleep(0);
    }
}

#[test]
fn force_wake_ends_unbounded_sleep() {
    ktest::launch(|| {
        make_process!("p0", 0, STACK_SIZE, p0);
        make_process!("p1", 1, STACK_SIZE, p1);
        kestrel::run()
    });

    ktest::expect_events(Duration::from_secs(10), &["p0:run", "p0:forced"]);
}
