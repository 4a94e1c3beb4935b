//! Host-side support for KESTREL integration tests.
//!
//! An integration test launches the kernel on a background thread, lets the
//! processes under test record named events, and asserts the observed event
//! order from the host test thread once a process signals completion.
//!
//! One scenario per test binary: the kernel is a process-wide singleton and
//! never shuts down, so each `tests/*.rs` file contains exactly one `#[test]`.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

static EVENTS: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
static DONE: Mutex<bool> = Mutex::new(false);
static DONE_COND: Condvar = Condvar::new();

/// Launch the kernel on a background thread. The closure registers the test
/// processes and enters `run()`; it never returns.
pub fn launch(boot: impl FnOnce() + Send + 'static) {
    std::thread::Builder::new()
        .name("kestrel-boot".to_string())
        .spawn(boot)
        .expect("failed to spawn kernel boot thread");
}

/// Record a named event. Called from test processes.
pub fn report(event: &'static str) {
    EVENTS.lock().unwrap().push(event);
}

/// Signal scenario completion. Called from the test process that finishes
/// the scenario.
pub fn complete() {
    let mut done = DONE.lock().unwrap();
    *done = true;
    DONE_COND.notify_all();
}

/// Wait for [`complete`] and return the recorded events.
///
/// Panics if the scenario does not complete within `timeout`.
pub fn wait_events(timeout: Duration) -> Vec<&'static str> {
    let done = DONE.lock().unwrap();
    let (done, result) = DONE_COND
        .wait_timeout_while(done, timeout, |done| !*done)
        .unwrap();
    drop(done);
    if result.timed_out() {
        panic!(
            "scenario did not complete within {:?}; events so far: {:?}",
            timeout,
            EVENTS.lock().unwrap()
        );
    }
    EVENTS.lock().unwrap().clone()
}

/// Wait for [`complete`] and assert that exactly `expected` was recorded,
/// in order.
pub fn expect_events(timeout: Duration, expected: &[&'static str]) {
    let events = wait_events(timeout);
    assert_eq!(events, expected);
}
