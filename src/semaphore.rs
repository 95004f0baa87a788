// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Counting semaphore services.
//!
//! A [`Semaphore`] tracks a signed counter. Every signal increments the
//! counter; every wait decrements it. A thread that drives the counter
//! negative parks until a signal arrives, and a negative count is exactly
//! the number of parked threads. Waiters are released in FIFO order.
//!
//! The semaphore is the rendezvous channel underneath
//! [`ThreadQueue`](crate::queue::ThreadQueue) and
//! [`Mutex`](crate::mutex::Mutex); use it directly when neither shape
//! fits.
//!
//! # Example
//!
//! ```
//! use interlock::{semaphore::Semaphore, Message, WaitOption};
//!
//! static ITEMS: Semaphore = Semaphore::new(0);
//!
//! // A producer hands over one item.
//! ITEMS.signal();
//!
//! // The pending signal is consumed without blocking.
//! assert_eq!(ITEMS.wait_timeout(WaitOption::no_wait()), Some(Message::OK));
//! // Nothing left: refuse to park and report the timeout.
//! assert_eq!(ITEMS.wait_timeout(WaitOption::no_wait()), None);
//! ```

use critical_section::CriticalSection;

use crate::park::{self, WaitList};
use crate::sys::{self, LockedCell};
use crate::{Message, WaitOption};

/// A counting semaphore with FIFO waiters.
///
/// To decrement the counter, use
///
/// - [`wait`](Self::wait) if you're willing to wait forever,
/// - [`wait_timeout`](Self::wait_timeout) to bound (or forbid) the wait,
/// - or their locked-class forms inside a guarded region.
///
/// To increment the counter, use [`signal`](Self::signal) from a thread or
/// [`signal_from_isr`](Self::signal_from_isr) from an interrupt handler.
/// [`reset`](Self::reset) releases every waiter at once.
///
/// See [the module-level documentation](crate::semaphore) for an example.
pub struct Semaphore {
    /// Available signals when positive; parked waiters when negative.
    count: LockedCell<i32>,
    waiters: WaitList,
}

impl Semaphore {
    /// Allocates a semaphore with `count` available signals.
    ///
    /// `count` must not be negative: negative values are reserved for
    /// counting waiters.
    pub const fn new(count: i32) -> Self {
        Self {
            count: LockedCell::new(count),
            waiters: WaitList::new(),
        }
    }

    /// Takes one signal, parking FIFO until one arrives or the wait option
    /// expires.
    ///
    /// Returns the message delivered by the signalling operation, or `None`
    /// on timeout. With [`WaitOption::no_wait`], a pending signal is
    /// consumed and reported as [`Message::OK`]; otherwise the timeout is
    /// reported synchronously and the thread never parks.
    ///
    /// Locked class, thread context, single lock level.
    pub fn wait_timeout_locked(
        &self,
        cs: CriticalSection<'_>,
        wait: WaitOption,
    ) -> Option<Message> {
        if wait.is_no_wait() {
            let count = self.count.get(cs);
            if count > 0 {
                self.count.set(cs, count - 1);
                return Some(Message::OK);
            }
            return None;
        }

        let count = self.count.get(cs) - 1;
        self.count.set(cs, count);
        if count >= 0 {
            return Some(Message::OK);
        }

        let slot = park::allocate(cs);
        self.waiters.push_back(cs, slot);
        let outcome = park::wait_here(cs, slot, wait);
        if outcome.is_none() {
            // The timeout won: undo this thread's decrement. The winner is
            // decided here, under the lock; a signal from now on finds this
            // thread gone.
            self.waiters.unlink(cs, slot);
            self.count.set(cs, self.count.get(cs) + 1);
        }
        park::release(cs, slot);
        outcome
    }

    /// Takes one signal, parking FIFO until one arrives.
    ///
    /// Locked class, thread context, single lock level.
    pub fn wait_locked(&self, cs: CriticalSection<'_>) -> Message {
        // Safety: an unbounded wait only returns on a delivery, so the
        // timeout branch that produces `None` is never taken.
        unsafe {
            self.wait_timeout_locked(cs, WaitOption::wait_forever())
                .unwrap_unchecked()
        }
    }

    /// Takes one signal, parking FIFO until one arrives or the wait option
    /// expires.
    ///
    /// Thread class.
    pub fn wait_timeout(&self, wait: WaitOption) -> Option<Message> {
        sys::with_locked(|cs| self.wait_timeout_locked(cs, wait))
    }

    /// Takes one signal, parking FIFO until one arrives.
    ///
    /// Thread class.
    pub fn wait(&self) -> Message {
        sys::with_locked(|cs| self.wait_locked(cs))
    }

    /// Releases the longest-waiting thread with `message`, or banks the
    /// signal when nobody waits.
    pub(crate) fn signal_with_locked(&self, cs: CriticalSection<'_>, message: Message) {
        let count = self.count.get(cs) + 1;
        self.count.set(cs, count);
        if count <= 0 {
            let slot = self.waiters.pop_front(cs);
            debug_assert!(slot.is_some());
            if let Some(slot) = slot {
                park::deliver(cs, slot, message);
            }
        }
    }

    /// Adds one signal, releasing the longest-waiting thread with
    /// [`Message::OK`] if any thread is parked.
    ///
    /// Locked class; never blocks, never reschedules.
    #[inline]
    pub fn signal_locked(&self, cs: CriticalSection<'_>) {
        self.signal_with_locked(cs, Message::OK);
    }

    /// Adds one signal from an interrupt handler.
    ///
    /// Interrupt class.
    pub fn signal_from_isr(&self) {
        sys::with_locked_from_isr(|cs| self.signal_locked(cs));
    }

    /// Adds one signal from thread context, rescheduling if the released
    /// thread outranks the caller.
    ///
    /// Thread class.
    pub fn signal(&self) {
        sys::with_locked(|cs| self.signal_locked(cs));
    }

    /// Releases every parked thread with `message` and forces the count to
    /// zero.
    ///
    /// Pending signals are discarded along with the waiters; afterwards the
    /// semaphore is exactly as [`new(0)`](Self::new) made it.
    ///
    /// Locked class; never blocks, never reschedules.
    pub fn reset_locked(&self, cs: CriticalSection<'_>, message: Message) {
        while let Some(slot) = self.waiters.pop_front(cs) {
            park::deliver(cs, slot, message);
        }
        self.count.set(cs, 0);
    }

    /// Releases every parked thread from an interrupt handler.
    ///
    /// Interrupt class.
    pub fn reset_from_isr(&self, message: Message) {
        sys::with_locked_from_isr(|cs| self.reset_locked(cs, message));
    }

    /// Releases every parked thread from thread context.
    ///
    /// Thread class.
    pub fn reset(&self, message: Message) {
        sys::with_locked(|cs| self.reset_locked(cs, message));
    }

    /// The current count: available signals when positive, parked waiters
    /// when negative.
    ///
    /// Locked class.
    #[inline]
    pub fn count_locked(&self, cs: CriticalSection<'_>) -> i32 {
        self.count.get(cs)
    }

    /// The current count, sampled from thread context.
    ///
    /// The value may be stale by the time the caller looks at it; use it
    /// for diagnostics, not decisions.
    ///
    /// Thread class.
    pub fn count(&self) -> i32 {
        sys::with_locked(|cs| self.count_locked(cs))
    }
}
