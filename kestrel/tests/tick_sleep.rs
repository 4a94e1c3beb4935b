//! A bounded sleep wakes on the tick that exhausts its timeout.

use kestrel::prelude::*;
use kestrel_test as ktest;
use std::time::Duration;

const STACK_SIZE: usize = 16 * 1024;

fn sleeper() {
    let before = kestrel::get_tick_count();
    kestrel::sleep(5);
    let after = kestrel::get_tick_count();

    // Lower bound is exact; the upper bound leaves room for host
    // scheduling noise between the two counter reads.
    let slept = after.wrapping_sub(before);
    assert!(
        (5..=10).contains(&slept),
        "slept {} ticks instead of 5",
        slept
    );
    ktest::report("woke");
    ktest::complete();
    loop {
        kestrel::sleep(0);
    }
}

#[test]
fn sleep_wakes_after_timeout_ticks() {
    ktest::launch(|| {
        make_process!("sleeper", 0, STACK_SIZE, sleeper);
        kestrel::run()
    });

    ktest::expect_events(Duration::from_secs(10), &["woke"]);
}
