//! One signal readies every waiter; the flag does not latch when the
//! broadcast consumed it.

use kestrel::prelude::*;
use kestrel_test as ktest;
use std::time::Duration;

const STACK_SIZE: usize = 16 * 1024;

static FLAG: EventFlag = EventFlag::new();

fn waiter0() {
    assert!(FLAG.wait(0));
    ktest::report("w0:first");
    assert!(FLAG.wait(0));
    ktest::report("w0:second");
    loop {
        kestrel::sleep(0);
    }
}

fn waiter1() {
    assert!(FLAG.wait(0));
    ktest::report("w1:first");
    assert!(FLAG.wait(0));
    ktest::report("w1:second");
    ktest::complete();
    loop {
        kestrel::sleep(0);
    }
}

fn signaller() {
    ktest::report("s:signal1");
    FLAG.signal();
    // Both waiters consumed the broadcast; nothing latched.
    assert!(!FLAG.is_signaled());
    ktest::report("s:signal2");
    FLAG.signal();
    loop {
        kestrel::sleep(0);
    }
}

#[test]
fn signal_broadcasts_to_all_waiters() {
    ktest::launch(|| {
        make_process!("waiter0", 0, STACK_SIZE, waiter0);
        make_process!("waiter1", 1, STACK_SIZE, waiter1);
        make_process!("signaller", 2, STACK_SIZE, signaller);
        kestrel::run()
    });

    ktest::expect_events(
        Duration::from_secs(10),
        &[
            "s:signal1",
            "w0:first",
            "w1:first",
            "s:signal2",
            "w0:second",
            "w1:second",
        ],
    );
}
