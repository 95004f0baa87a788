// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Wake-all releases every waiter with one message, and pending-signal
//! bookkeeping holds up.

use std::time::{Duration, Instant};

use interlock::{queue::ThreadQueue, sys, Message, WaitOption};

static STORM: ThreadQueue = ThreadQueue::new();
static IDLE: ThreadQueue = ThreadQueue::new();
static PREARMED: ThreadQueue = ThreadQueue::new();

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

#[test]
fn wakeup_all_releases_every_waiter_with_the_same_message() {
    const WAITERS: i32 = 4;

    let workers: Vec<_> = (0..WAITERS)
        .map(|position| {
            let worker = std::thread::spawn(|| {
                assert_eq!(STORM.enqueue(), Message(-55));
            });
            wait_for("a worker to park", || STORM.pending() == -(position + 1));
            worker
        })
        .collect();

    // The release comes from a simulated interrupt handler.
    sys::irq_prologue();
    STORM.wakeup_all_from_isr(Message(-55));
    sys::irq_epilogue();

    for worker in workers {
        worker.join().expect("a worker saw the wrong message");
    }
    assert_eq!(STORM.pending(), 0);
}

#[test]
fn wakeup_all_with_nobody_parked_leaves_nothing_pending() {
    IDLE.wakeup_all(Message::RESET);
    assert_eq!(IDLE.pending(), 0);
    // Unlike wake-one, no signal was banked.
    assert_eq!(IDLE.enqueue_timeout(WaitOption::no_wait()), None);
}

#[test]
fn a_banked_wakeup_is_consumed_without_blocking() {
    PREARMED.wakeup_one(Message(9));
    assert_eq!(PREARMED.pending(), 1);

    // The enqueue consumes the banked signal synchronously. The message
    // itself was not retained: an undelivered wakeup degrades to "ok".
    let started = Instant::now();
    assert_eq!(
        PREARMED.enqueue_timeout(WaitOption::wait_forever()),
        Some(Message::OK)
    );
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(PREARMED.pending(), 0);
}

#[test]
fn refusing_to_wait_reports_the_timeout_synchronously() {
    let queue = ThreadQueue::new();
    let started = Instant::now();
    assert_eq!(queue.enqueue_timeout(WaitOption::no_wait()), None);
    assert!(started.elapsed() < Duration::from_secs(1));
}
