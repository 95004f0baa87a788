// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Thread suspension services.
//!
//! Interlock does not create threads — the executive owns them. What this
//! module provides is the machinery for a thread to *stop*: a timed
//! [`sleep`], and the [`ThreadReference`] channel through which exactly one
//! parked thread is later woken with a result code.
//!
//! A `ThreadReference` is the usual handshake between a driver thread and
//! its interrupt handler: the thread starts an operation, suspends on the
//! reference inside its guarded region, and the completion interrupt
//! resumes it with the outcome.
//!
//! # Example
//!
//! ```
//! use interlock::{sys, thread::ThreadReference, Message};
//! use std::thread;
//!
//! static DONE: ThreadReference = ThreadReference::new();
//!
//! let worker = thread::spawn(|| {
//!     // Park until someone else reports the result.
//!     let message = sys::with_locked(|cs| DONE.suspend_locked(cs));
//!     assert_eq!(message, Message(42));
//! });
//!
//! // Wait for the worker to park, then wake it with the result.
//! while !sys::with_locked(|cs| DONE.is_waiting_locked(cs)) {
//!     thread::yield_now();
//! }
//! DONE.resume(Message(42));
//! worker.join().unwrap();
//! ```

use critical_section::CriticalSection;

use crate::park;
use crate::sys::{self, debug_check, LockedCell};
use crate::time::Tick;
use crate::{Message, WaitOption};

/// Suspends the invoking thread for the specified number of ticks.
///
/// A delay of [`Tick::MAX`] is a plain (very long) delay, not an unbounded
/// wait. A delay of zero is a checked parameter error: use a reschedule
/// check, not a sleep, to yield.
///
/// Thread class.
pub fn sleep(ticks: Tick) {
    sys::with_locked(|cs| sleep_locked(cs, ticks));
}

/// Suspends the invoking thread for the specified number of ticks.
///
/// Locked class, thread context, single lock level; the critical section is
/// released while the thread sleeps and re-entered before returning.
pub fn sleep_locked(cs: CriticalSection<'_>, ticks: Tick) {
    debug_check!(ticks != 0, "thread::sleep(), zero delay");
    if ticks == 0 {
        return;
    }
    // Clamp below the wait-forever sentinel: a maximum-width delay stays a
    // delay.
    let wait = WaitOption(u32::from(ticks).min(!0 - 1));
    let slot = park::allocate(cs);
    let _ = park::wait_here(cs, slot, wait);
    park::release(cs, slot);
}

/// A single-slot channel for parking one thread and resuming it later.
///
/// The reference is either *empty* or holds exactly one suspended thread.
/// Suspending while another thread occupies the reference is a checked
/// error; resuming an empty reference is a harmless no-op, because resumes
/// routinely race the suspend's own timeout and only one side may win.
///
/// See [the module-level documentation](crate::thread) for an example.
pub struct ThreadReference {
    /// The occupying thread's waiter slot, or [`park::NONE`].
    slot: LockedCell<u8>,
}

impl ThreadReference {
    /// Allocates an empty reference.
    pub const fn new() -> Self {
        Self {
            slot: LockedCell::new(park::NONE),
        }
    }

    /// Parks the calling thread on this reference until a resume or the
    /// wait option expires.
    ///
    /// Returns the resumer's message, or `None` if the timeout won. With
    /// [`WaitOption::no_wait`] the timeout is reported synchronously and
    /// the reference is never occupied.
    ///
    /// Locked class, thread context, single lock level; the critical
    /// section is released while the thread is parked.
    pub fn suspend_timeout_locked(
        &self,
        cs: CriticalSection<'_>,
        wait: WaitOption,
    ) -> Option<Message> {
        debug_check!(
            self.slot.get(cs) == park::NONE,
            "ThreadReference::suspend(), reference occupied"
        );
        if wait.is_no_wait() {
            return None;
        }

        let slot = park::allocate(cs);
        self.slot.set(cs, slot);
        let outcome = park::wait_here(cs, slot, wait);
        // On the timeout path the reference still points at this thread;
        // empty it so a late resume finds nobody. (A resume that won
        // already emptied it — or refilled it with a newer suspender.)
        if self.slot.get(cs) == slot {
            self.slot.set(cs, park::NONE);
        }
        park::release(cs, slot);
        outcome
    }

    /// Parks the calling thread on this reference until a resume.
    ///
    /// Locked class, thread context, single lock level.
    pub fn suspend_locked(&self, cs: CriticalSection<'_>) -> Message {
        // Safety: an unbounded wait only returns on a delivery, so the
        // timeout branch that produces `None` is never taken.
        unsafe {
            self.suspend_timeout_locked(cs, WaitOption::wait_forever())
                .unwrap_unchecked()
        }
    }

    /// Wakes the parked thread with `message`, emptying the reference.
    ///
    /// A no-op when the reference is empty.
    ///
    /// Locked class; never blocks, never reschedules.
    pub fn resume_locked(&self, cs: CriticalSection<'_>, message: Message) {
        let slot = self.slot.replace(cs, park::NONE);
        if slot != park::NONE {
            park::deliver(cs, slot, message);
        }
    }

    /// Wakes the parked thread from an interrupt handler.
    ///
    /// The handler's [`irq_epilogue`](crate::sys::irq_epilogue) performs
    /// the reschedule check.
    ///
    /// Interrupt class.
    pub fn resume_from_isr(&self, message: Message) {
        sys::with_locked_from_isr(|cs| self.resume_locked(cs, message));
    }

    /// Wakes the parked thread from thread context, with an immediate
    /// reschedule check.
    ///
    /// Thread class.
    pub fn resume(&self, message: Message) {
        sys::with_locked(|cs| self.resume_locked(cs, message));
    }

    /// Returns `true` while a thread is parked on this reference.
    ///
    /// Locked class.
    #[inline]
    pub fn is_waiting_locked(&self, cs: CriticalSection<'_>) -> bool {
        self.slot.get(cs) != park::NONE
    }
}

impl Default for ThreadReference {
    fn default() -> Self {
        Self::new()
    }
}
