//! Unlock hands the mutex directly to the highest-priority waiter; the
//! lower-priority waiter stays blocked until its turn.

use kestrel::prelude::*;
use kestrel_test as ktest;
use std::time::Duration;

const STACK_SIZE: usize = 16 * 1024;

static MUTEX: RawMutex = RawMutex::new();

fn p0() {
    kestrel::sleep(2);
    MUTEX.lock();
    ktest::report("p0:locked");
    assert!(MUTEX.is_locked());
    MUTEX.unlock();
    ktest::report("p0:unlocked");
    loop {
        kestrel::sleep(0);
    }
}

fn p1() {
    kestrel::sleep(3);
    MUTEX.lock();
    ktest::report("p1:locked");
    MUTEX.unlock();
    assert!(!MUTEX.is_locked());
    ktest::report("p1:unlocked");
    ktest::complete();
    loop {
        kestrel::sleep(0);
    }
}

fn p2() {
    MUTEX.lock();
    ktest::report("p2:locked");
    kestrel::sleep(5);
    MUTEX.unlock();
    loop {
        kestrel::sleep(0);
    }
}

#[test]
fn unlock_transfers_ownership_by_priority() {
    ktest::launch(|| {
        make_process!("p0", 0, STACK_SIZE, p0);
        make_process!("p1", 1, STACK_SIZE, p1);
        make_process!("p2", 2, STACK_SIZE, p2);
        kestrel::run()
    });

    ktest::expect_events(
        Duration::from_secs(10),
        &[
            "p2:locked",
            "p0:locked",
            "p0:unlocked",
            "p1:locked",
            "p1:unlocked",
        ],
    );
}
