// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! The suspend/resume channel: parking, wakeup messages, and the
//! empty-reference no-op.

use std::time::{Duration, Instant};

use interlock::{sys, thread::ThreadReference, Message};

static FROM_THREAD: ThreadReference = ThreadReference::new();
static FROM_ISR: ThreadReference = ThreadReference::new();
static UNUSED: ThreadReference = ThreadReference::new();

fn wait_until_parked(reference: &'static ThreadReference) {
    let start = Instant::now();
    while !sys::with_locked(|cs| reference.is_waiting_locked(cs)) {
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "the thread never parked"
        );
        std::thread::yield_now();
    }
}

#[test]
fn resume_carries_the_message() {
    let worker = std::thread::spawn(|| {
        let message = sys::with_locked(|cs| FROM_THREAD.suspend_locked(cs));
        assert_eq!(message, Message(1234));
    });

    wait_until_parked(&FROM_THREAD);
    FROM_THREAD.resume(Message(1234));
    worker.join().expect("the waiter saw the wrong message");

    // The reference is empty again.
    assert!(!sys::with_locked(|cs| FROM_THREAD.is_waiting_locked(cs)));
}

#[test]
fn resume_from_a_simulated_interrupt() {
    let worker = std::thread::spawn(|| {
        let message = sys::with_locked(|cs| FROM_ISR.suspend_locked(cs));
        assert_eq!(message, Message(-7));
    });

    wait_until_parked(&FROM_ISR);

    sys::irq_prologue();
    FROM_ISR.resume_from_isr(Message(-7));
    sys::irq_epilogue();

    worker.join().expect("the waiter saw the wrong message");
}

#[test]
fn resuming_an_empty_reference_is_a_no_op() {
    // Callable any number of times, from either wakeup path.
    for round in 0..10 {
        UNUSED.resume(Message(round));
    }
    sys::irq_prologue();
    UNUSED.resume_from_isr(Message::OK);
    sys::irq_epilogue();

    assert!(!sys::with_locked(|cs| UNUSED.is_waiting_locked(cs)));
}
