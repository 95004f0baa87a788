// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Mutex round trips, contention, and the reverse-order discipline done
//! right.

use std::time::{Duration, Instant};

use interlock::{mutex::Mutex, WaitOption};

static OUTER: Mutex = Mutex::new();
static INNER: Mutex = Mutex::new();
static CONTENDED: Mutex = Mutex::new();

#[test]
fn nested_locks_release_in_reverse_order() {
    OUTER.lock();
    INNER.lock();
    INNER.unlock();
    OUTER.unlock();

    // Both are available again.
    assert!(OUTER.try_lock());
    assert!(INNER.try_lock());
    INNER.unlock();
    OUTER.unlock();
}

#[test]
fn try_lock_fails_while_another_thread_holds_the_permit() {
    use std::sync::mpsc;

    let (claimed_tx, claimed) = mpsc::channel();
    let (release_tx, release) = mpsc::channel();

    let holder = std::thread::spawn(move || {
        CONTENDED.lock();
        claimed_tx.send(()).unwrap();
        release.recv().unwrap();
        CONTENDED.unlock();
    });

    claimed.recv().unwrap();
    assert!(!CONTENDED.try_lock());

    // A bounded wait times out while the permit is elsewhere...
    let started = Instant::now();
    assert!(!CONTENDED.lock_timeout(WaitOption(50)));
    assert!(started.elapsed() >= Duration::from_millis(45));

    release_tx.send(()).unwrap();
    holder.join().unwrap();

    // ...and succeeds once it comes back.
    assert!(CONTENDED.lock_timeout(WaitOption(1_000)));
    CONTENDED.unlock();
}

#[test]
fn a_blocked_locker_receives_the_handoff() {
    static HANDOFF: Mutex = Mutex::new();
    static TOKEN: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(0);
    use std::sync::atomic::Ordering;

    HANDOFF.lock();

    let worker = std::thread::spawn(|| {
        HANDOFF.lock();
        let seen = TOKEN.load(Ordering::Relaxed);
        HANDOFF.unlock();
        assert_eq!(seen, 1, "the worker ran before the handoff");
    });

    // Give the worker time to park on the permit. Even if it is late and
    // only locks after the handoff, the token is already published, so the
    // assertion below stays sound.
    std::thread::sleep(Duration::from_millis(100));
    TOKEN.store(1, Ordering::Relaxed);
    HANDOFF.unlock();

    worker.join().expect("the worker never acquired the mutex");
}

#[test]
fn with_lock_scopes_the_permit() {
    let shared = Mutex::new();

    let doubled = shared.with_lock(|| 21 * 2);
    assert_eq!(doubled, 42);

    assert!(shared.try_lock());
    shared.unlock();
}
