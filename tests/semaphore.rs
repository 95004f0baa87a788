// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Counting semaphore behavior: counts, blocking, and bulk release.

use std::time::{Duration, Instant};

use interlock::{semaphore::Semaphore, Message, WaitOption};

static HANDOFF: Semaphore = Semaphore::new(0);
static DRAINED: Semaphore = Semaphore::new(0);

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
fn initial_signals_are_consumed_without_blocking() {
    let budget = Semaphore::new(2);

    assert_eq!(budget.wait_timeout(WaitOption::no_wait()), Some(Message::OK));
    assert_eq!(budget.wait_timeout(WaitOption::no_wait()), Some(Message::OK));
    assert_eq!(budget.wait_timeout(WaitOption::no_wait()), None);
    assert_eq!(budget.count(), 0);
}

#[test]
fn a_signal_releases_a_parked_thread() {
    let worker = std::thread::spawn(|| {
        assert_eq!(HANDOFF.wait(), Message::OK);
    });

    // The count goes negative while the worker is parked.
    wait_for("the worker to park", || HANDOFF.count() == -1);

    HANDOFF.signal();
    worker.join().expect("the waiter saw the wrong message");
    assert_eq!(HANDOFF.count(), 0);
}

#[test]
fn a_timed_wait_restores_the_count_on_timeout() {
    let empty = Semaphore::new(0);
    assert_eq!(empty.wait_timeout(WaitOption(30)), None);
    // The timed-out waiter backed its decrement out.
    assert_eq!(empty.count(), 0);
}

#[test]
fn reset_releases_every_waiter_with_the_message() {
    const WAITERS: i32 = 3;

    let workers: Vec<_> = (0..WAITERS)
        .map(|position| {
            let worker = std::thread::spawn(|| {
                assert_eq!(DRAINED.wait(), Message::RESET);
            });
            wait_for("a worker to park", || DRAINED.count() == -(position + 1));
            worker
        })
        .collect();

    DRAINED.reset(Message::RESET);

    for worker in workers {
        worker.join().expect("a waiter saw the wrong message");
    }
    assert_eq!(DRAINED.count(), 0);
}
