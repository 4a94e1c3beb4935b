//! A pop on an empty channel with a timeout returns empty-handed once the
//! timeout expires.

use kestrel::prelude::*;
use kestrel_test as ktest;
use std::time::Duration;

const STACK_SIZE: usize = 16 * 1024;

static CHANNEL: Channel<u32, 4> = Channel::new();

fn consumer() {
    let before = kestrel::get_tick_count();
    assert_eq!(CHANNEL.pop(3), None);
    let waited = kestrel::get_tick_count().wrapping_sub(before);
    assert!(
        (3..=8).contains(&waited),
        "waited {} ticks instead of 3",
        waited
    );
    assert_eq!(CHANNEL.get_count(), 0);
    ktest::report("timed-out");
    ktest::complete();
    loop {
        kestrel::sleep(0);
    }
}

#[test]
fn pop_times_out_on_empty_channel() {
    ktest::launch(|| {
        make_process!("consumer", 0, STACK_SIZE, consumer);
        kestrel::run()
    });

    ktest::expect_events(Duration::from_secs(10), &["timed-out"]);
}
