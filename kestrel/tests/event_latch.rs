//! Signalling with no waiters latches exactly one wait; a cleared or
//! unsignalled flag makes a bounded wait time out.

use kestrel::prelude::*;
use kestrel_test as ktest;
use std::time::Duration;

const STACK_SIZE: usize = 16 * 1024;

static FLAG: EventFlag = EventFlag::new();

fn proc0() {
    assert!(!FLAG.is_signaled());

    FLAG.signal();
    assert!(FLAG.is_signaled());
    // The latched signal satisfies one wait without suspending.
    assert!(FLAG.wait(0));
    assert!(!FLAG.is_signaled());

    // No signal: a bounded wait returns false after its timeout.
    let before = kestrel::get_tick_count();
    assert!(!FLAG.wait(3));
    let waited = kestrel::get_tick_count().wrapping_sub(before);
    assert!(
        (3..=8).contains(&waited),
        "waited {} ticks instead of 3",
        waited
    );

    // clear() drops a latched signal.
    FLAG.signal();
    FLAG.clear();
    assert!(!FLAG.is_signaled());
    assert!(!FLAG.wait(2));

    ktest::report("done");
    ktest::complete();
    loop {
        kestrel::sleep(0);
    }
}

#[test]
fn latch_and_timeout_semantics() {
    ktest::launch(|| {
        make_process!("proc0", 0, STACK_SIZE, proc0);
        kestrel::run()
    });

    ktest::expect_events(Duration::from_secs(10), &["done"]);
}
