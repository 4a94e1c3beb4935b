//! Bulk channel transfers, head/tail access, and the non-blocking ISR
//! variants.

use kestrel::prelude::*;
use kestrel_test as ktest;
use std::time::Duration;

const STACK_SIZE: usize = 16 * 1024;

static CHANNEL: Channel<u32, 4> = Channel::new();

fn consumer() {
    // Blocks until the producer has written all three items.
    let mut buf = [0u32; 3];
    assert!(CHANNEL.read(&mut buf, 0));
    assert_eq!(buf, [1, 2, 3]);
    ktest::report("bulk-read");

    // ISR variants write what fits and read what is there.
    assert_eq!(CHANNEL.write_isr(&[10, 11, 12, 13, 14]), 4);
    assert_eq!(CHANNEL.get_free_size(), 0);
    let mut head = [0u32; 2];
    assert_eq!(CHANNEL.read_isr(&mut head), 2);
    assert_eq!(head, [10, 11]);

    // Head insertion and tail removal around the remaining {12, 13}.
    CHANNEL.push_front(9);
    assert_eq!(CHANNEL.pop_back(0), Some(13));
    assert_eq!(CHANNEL.pop(0), Some(9));
    assert_eq!(CHANNEL.pop(0), Some(12));
    assert_eq!(CHANNEL.get_count(), 0);

    CHANNEL.write(&[7, 8]);
    let mut pair = [0u32; 2];
    assert!(CHANNEL.read(&mut pair, 0));
    assert_eq!(pair, [7, 8]);

    CHANNEL.push(1);
    CHANNEL.push(2);
    CHANNEL.flush();
    assert_eq!(CHANNEL.get_count(), 0);
    assert_eq!(CHANNEL.get_free_size(), 4);

    ktest::report("done");
    ktest::complete();
    loop {
        kestrel::sleep(0);
    }
}

fn producer() {
    ktest::report("write");
    CHANNEL.write(&[1, 2, 3]);
    loop {
        kestrel::sleep(0);
    }
}

#[test]
fn bulk_and_isr_channel_operations() {
    ktest::launch(|| {
        make_process!("consumer", 0, STACK_SIZE, consumer);
        make_process!("producer", 1, STACK_SIZE, producer);
        kestrel::run()
    });

    ktest::expect_events(Duration::from_secs(10), &["write", "bulk-read", "done"]);
}
