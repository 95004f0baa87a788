// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Timed suspension: automatic wakeups, the timeout/resume race, and
//! sleeping.

use std::time::{Duration, Instant};

use interlock::{sys, thread, thread::ThreadReference, Message, WaitOption};

static NEVER_RESUMED: ThreadReference = ThreadReference::new();
static RACED: ThreadReference = ThreadReference::new();

#[test]
fn a_timed_suspend_with_no_resume_times_out_once() {
    let started = Instant::now();
    let outcome =
        sys::with_locked(|cs| NEVER_RESUMED.suspend_timeout_locked(cs, WaitOption(100)));

    assert_eq!(outcome, None);
    assert!(
        started.elapsed() >= Duration::from_millis(90),
        "the timeout fired early"
    );
    // The timeout emptied the reference on its way out.
    assert!(!sys::with_locked(|cs| NEVER_RESUMED.is_waiting_locked(cs)));
}

#[test]
fn an_immediate_suspend_never_parks() {
    let reference = ThreadReference::new();
    let started = Instant::now();
    let outcome =
        sys::with_locked(|cs| reference.suspend_timeout_locked(cs, WaitOption::no_wait()));
    assert_eq!(outcome, None);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!sys::with_locked(|cs| reference.is_waiting_locked(cs)));
}

#[test]
fn a_resume_after_the_timeout_is_harmless() {
    let outcome = sys::with_locked(|cs| RACED.suspend_timeout_locked(cs, WaitOption(25)));
    assert_eq!(outcome, None);

    // The "late" side of the race: the reference is already empty, so
    // exactly one side — the timeout — took effect.
    RACED.resume(Message(99));

    // The channel still works afterwards.
    let worker = std::thread::spawn(|| {
        let message = sys::with_locked(|cs| RACED.suspend_locked(cs));
        assert_eq!(message, Message(31));
    });
    let start = Instant::now();
    while !sys::with_locked(|cs| RACED.is_waiting_locked(cs)) {
        assert!(start.elapsed() < Duration::from_secs(5), "never parked");
        std::thread::yield_now();
    }
    RACED.resume(Message(31));
    worker.join().expect("the waiter saw a stale message");
}

#[test]
fn an_explicit_resume_beats_a_generous_timeout() {
    static SLOW: ThreadReference = ThreadReference::new();

    let worker = std::thread::spawn(|| {
        let outcome = sys::with_locked(|cs| {
            SLOW.suspend_timeout_locked(cs, WaitOption(60_000))
        });
        assert_eq!(outcome, Some(Message(5)));
    });

    let start = Instant::now();
    while !sys::with_locked(|cs| SLOW.is_waiting_locked(cs)) {
        assert!(start.elapsed() < Duration::from_secs(5), "never parked");
        std::thread::yield_now();
    }
    SLOW.resume(Message(5));
    worker.join().expect("the resume lost the race");
}

#[test]
fn sleep_delays_for_at_least_the_requested_ticks() {
    let started = Instant::now();
    thread::sleep(50);
    assert!(
        started.elapsed() >= Duration::from_millis(45),
        "sleep returned early"
    );
}
