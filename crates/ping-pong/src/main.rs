// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! A small driver-shaped demo on the hosted executive.
//!
//! Two threads ping-pong messages through wait queues while a third thread
//! plays the peripheral's interrupt handler: every "interrupt" broadcasts
//! completion flags on an event source, whose callback wakes whoever is
//! waiting. Run it with `cargo run -p interlock-ping-pong`.

use critical_section::CriticalSection;
use interlock::{
    event_source::EventSource, mutex::Mutex, queue::ThreadQueue, sys, thread, Message,
};

const ROUNDS: i32 = 5;
const TRANSFER_DONE: u32 = 0b01;

static REQUESTS: ThreadQueue = ThreadQueue::new();
static REPLIES: ThreadQueue = ThreadQueue::new();

static COMPLETIONS: EventSource = EventSource::with_callback(on_completion, 0);
static COMPLETION_WAITERS: ThreadQueue = ThreadQueue::new();

static CONSOLE: Mutex = Mutex::new();

fn on_completion(cs: CriticalSection<'_>, _source: &EventSource) {
    // Wake-one banks the signal when the consumer is not parked yet, so a
    // completion that beats the consumer to the queue is not lost.
    COMPLETION_WAITERS.wakeup_one_locked(cs, Message::OK);
}

fn say(line: &str) {
    CONSOLE.with_lock(|| println!("{line}"));
}

/// Spin until one thread is parked on `queue`.
///
/// A wakeup that arrives before its consumer parks is banked without its
/// payload, so both sides confirm the rendezvous before delivering a
/// sequence number.
fn wait_until_parked(queue: &'static ThreadQueue) {
    while queue.pending() != -1 {
        thread::sleep(1);
    }
}

/// Answers every request with the same sequence number.
fn pong() {
    for _ in 0..ROUNDS {
        let request = REQUESTS.enqueue();
        say(&format!("pong: request {}", request.0));
        wait_until_parked(&REPLIES);
        REPLIES.wakeup_one(request);
    }
}

/// Plays the peripheral: a completion interrupt fires every few ticks.
fn peripheral() {
    for _ in 0..ROUNDS {
        thread::sleep(interlock::time::ticks_from_millis(20));
        sys::irq_prologue();
        COMPLETIONS.broadcast_flags_from_isr(TRANSFER_DONE);
        sys::irq_epilogue();
    }
}

fn main() {
    let responder = std::thread::spawn(pong);
    let interrupts = std::thread::spawn(peripheral);

    for sequence in 1..=ROUNDS {
        wait_until_parked(&REQUESTS);
        REQUESTS.wakeup_one(Message(sequence));
        let reply = REPLIES.enqueue();
        assert_eq!(reply, Message(sequence));
        say(&format!("ping: reply {}", reply.0));

        // Wait for the peripheral's interrupt, then collect its flags.
        COMPLETION_WAITERS.enqueue();
        let flags = COMPLETIONS.take_flags();
        say(&format!("ping: completion flags {flags:#04b}"));
    }

    responder.join().expect("the responder failed");
    interrupts.join().expect("the peripheral failed");
    say("done");
}
