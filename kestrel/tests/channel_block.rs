//! A producer blocks on a full channel and resumes as soon as the consumer
//! frees a slot; FIFO order is preserved across the block.

use kestrel::prelude::*;
use kestrel_test as ktest;
use std::time::Duration;

const STACK_SIZE: usize = 16 * 1024;

static CHANNEL: Channel<u32, 2> = Channel::new();

fn producer() {
    CHANNEL.push(1);
    CHANNEL.push(2);
    ktest::report("pushed2");
    CHANNEL.push(3);
    ktest::report("pushed3");
    loop {
        kestrel::sleep(0);
    }
}

fn consumer() {
    assert_eq!(CHANNEL.pop(0), Some(1));
    ktest::report("got1");
    assert_eq!(CHANNEL.pop(0), Some(2));
    ktest::report("got2");
    assert_eq!(CHANNEL.pop(0), Some(3));
    ktest::report("got3");
    assert_eq!(CHANNEL.get_count(), 0);
    ktest::complete();
    loop {
        kestrel::sleep(0);
    }
}

#[test]
fn producer_blocks_until_consumer_frees_a_slot() {
    ktest::launch(|| {
        make_process!("producer", 0, STACK_SIZE, producer);
        make_process!("consumer", 1, STACK_SIZE, consumer);
        kestrel::run()
    });

    ktest::expect_events(
        Duration::from_secs(10),
        &["pushed2", "pushed3", "got1", "got2", "got3"],
    );
}
