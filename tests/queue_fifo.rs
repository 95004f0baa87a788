// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Wake-one releases queue waiters in FIFO order.

use std::time::{Duration, Instant};

use interlock::{queue::ThreadQueue, Message};

static QUEUE_OF_TWO: ThreadQueue = ThreadQueue::new();
static QUEUE_OF_FIVE: ThreadQueue = ThreadQueue::new();

/// Spin until `done` reports true, or fail the test.
fn wait_for(what: &str, done: impl Fn() -> bool) {
    let start = Instant::now();
    while !done() {
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "timed out waiting for {what}"
        );
        std::thread::yield_now();
    }
}

/// Park `count` threads on `queue`, one at a time so the arrival order is
/// fixed, then wake them one by one. Each waiter must receive the message
/// matching its arrival position.
fn fifo_release(queue: &'static ThreadQueue, count: i32) {
    let workers: Vec<_> = (0..count)
        .map(|position| {
            let worker = std::thread::spawn(move || {
                let message = queue.enqueue();
                assert_eq!(message, Message(100 + position));
            });
            // The next thread may only arrive once this one is parked.
            wait_for("a worker to park", || queue.pending() == -(position + 1));
            worker
        })
        .collect();

    for position in 0..count {
        queue.wakeup_one(Message(100 + position));
    }

    for worker in workers {
        worker.join().expect("a worker saw the wrong message");
    }
    assert_eq!(queue.pending(), 0);
}

#[test]
fn two_waiters_release_in_arrival_order() {
    fifo_release(&QUEUE_OF_TWO, 2);
}

#[test]
fn five_waiters_release_in_arrival_order() {
    fifo_release(&QUEUE_OF_FIVE, 5);
}
