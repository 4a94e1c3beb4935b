//! Typed message passing: payload assignment, send/wait, and the pending
//! latch when no receiver waits.

use kestrel::prelude::*;
use kestrel_test as ktest;
use std::time::Duration;

const STACK_SIZE: usize = 16 * 1024;

static MESSAGE: Message<u32> = Message::new(0);
static SCRATCH: Message<u32> = Message::new(0);

fn receiver() {
    assert!(MESSAGE.wait(0));
    assert_eq!(MESSAGE.get(), 7);
    ktest::report("r:first");

    assert!(MESSAGE.wait(0));
    let mut value = 0;
    MESSAGE.out(&mut value);
    assert_eq!(value, 9);
    ktest::report("r:second");
    ktest::complete();
    loop {
        kestrel::sleep(0);
    }
}

fn sender() {
    // No waiter on SCRATCH: the send latches and one wait consumes it.
    SCRATCH.assign(5);
    SCRATCH.send();
    assert!(SCRATCH.wait(0));
    assert_eq!(SCRATCH.get(), 5);
    // The slot keeps its last value between sends.
    assert_eq!(SCRATCH.get(), 5);
    ktest::report("s:latch-ok");

    MESSAGE.assign(7);
    MESSAGE.send();

    MESSAGE.assign(9);
    MESSAGE.send();
    loop {
        kestrel::sleep(0);
    }
}

#[test]
fn message_send_wait_and_latch() {
    ktest::launch(|| {
        make_process!("receiver", 0, STACK_SIZE, receiver);
        make_process!("sender", 1, STACK_SIZE, sender);
        kestrel::run()
    });

    ktest::expect_events(
        Duration::from_secs(10),
        &["s:latch-ok", "r:first", "r:second"],
    );
}
