// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Thread wait-queue services.
//!
//! A [`ThreadQueue`] is a place for any number of threads to sleep until
//! something happens. It is a [`Semaphore`] worn as a rendezvous channel:
//! enqueuing waits on the semaphore, waking signals it, and the semaphore's
//! FIFO waiter order is the queue's fairness guarantee.
//!
//! The typical owner is a driver: threads enqueue while a transfer is in
//! flight, and the completion interrupt wakes one (or every) waiter with
//! the outcome.
//!
//! # Example
//!
//! ```
//! use interlock::{queue::ThreadQueue, Message, WaitOption};
//!
//! static RX_WAITERS: ThreadQueue = ThreadQueue::new();
//!
//! // Refusing to wait on an idle queue reports the timeout synchronously.
//! assert_eq!(RX_WAITERS.enqueue_timeout(WaitOption::no_wait()), None);
//!
//! // A wakeup with nobody parked leaves one pending signal...
//! RX_WAITERS.wakeup_one(Message::OK);
//! // ...which the next enqueue consumes without blocking.
//! assert_eq!(
//!     RX_WAITERS.enqueue_timeout(WaitOption::wait_forever()),
//!     Some(Message::OK),
//! );
//! ```

use critical_section::CriticalSection;

use crate::semaphore::Semaphore;
use crate::sys;
use crate::{Message, WaitOption};

/// A queue of sleeping threads, woken one at a time or all together.
///
/// To park on the queue, use [`enqueue`](Self::enqueue) or
/// [`enqueue_timeout`](Self::enqueue_timeout) (or their locked-class
/// forms). To release threads, use the `wakeup_one*` and `wakeup_all*`
/// families; wake-one releases the longest-waiting thread first.
///
/// See [the module-level documentation](crate::queue) for an example.
pub struct ThreadQueue {
    channel: Semaphore,
}

impl ThreadQueue {
    /// Allocates a queue with no sleeping threads and no pending signals.
    pub const fn new() -> Self {
        Self {
            channel: Semaphore::new(0),
        }
    }

    /// Parks the calling thread until a wakeup delivers a message or the
    /// wait option expires.
    ///
    /// Returns the message passed by the waking operation, or `None` on
    /// timeout. With [`WaitOption::no_wait`] the timeout is reported
    /// synchronously. A wakeup that arrived before anyone was parked is
    /// consumed without blocking and reported as [`Message::OK`].
    ///
    /// Locked class, thread context, single lock level; the critical
    /// section is released while the thread is parked.
    #[inline]
    pub fn enqueue_timeout_locked(
        &self,
        cs: CriticalSection<'_>,
        wait: WaitOption,
    ) -> Option<Message> {
        self.channel.wait_timeout_locked(cs, wait)
    }

    /// Parks the calling thread until a wakeup delivers a message.
    ///
    /// Locked class, thread context, single lock level.
    #[inline]
    pub fn enqueue_locked(&self, cs: CriticalSection<'_>) -> Message {
        self.channel.wait_locked(cs)
    }

    /// Parks the calling thread until a wakeup delivers a message or the
    /// wait option expires.
    ///
    /// Thread class.
    pub fn enqueue_timeout(&self, wait: WaitOption) -> Option<Message> {
        sys::with_locked(|cs| self.enqueue_timeout_locked(cs, wait))
    }

    /// Parks the calling thread until a wakeup delivers a message.
    ///
    /// Thread class.
    pub fn enqueue(&self) -> Message {
        sys::with_locked(|cs| self.enqueue_locked(cs))
    }

    /// Releases the longest-waiting thread with `message`.
    ///
    /// With nobody parked, the wakeup is banked as a pending signal for the
    /// next enqueue.
    ///
    /// Locked class; never blocks, never reschedules.
    #[inline]
    pub fn wakeup_one_locked(&self, cs: CriticalSection<'_>, message: Message) {
        self.channel.signal_with_locked(cs, message);
    }

    /// Releases every parked thread with the same `message`.
    ///
    /// Afterwards the queue holds zero pending signals, whether or not
    /// anybody was parked.
    ///
    /// Locked class; never blocks, never reschedules.
    #[inline]
    pub fn wakeup_all_locked(&self, cs: CriticalSection<'_>, message: Message) {
        self.channel.reset_locked(cs, message);
    }

    /// Releases the longest-waiting thread from an interrupt handler.
    ///
    /// The handler's [`irq_epilogue`](crate::sys::irq_epilogue) performs
    /// the reschedule check.
    ///
    /// Interrupt class.
    pub fn wakeup_one_from_isr(&self, message: Message) {
        sys::with_locked_from_isr(|cs| self.wakeup_one_locked(cs, message));
    }

    /// Releases every parked thread from an interrupt handler.
    ///
    /// Interrupt class.
    pub fn wakeup_all_from_isr(&self, message: Message) {
        sys::with_locked_from_isr(|cs| self.wakeup_all_locked(cs, message));
    }

    /// Releases the longest-waiting thread from thread context, with an
    /// immediate reschedule check.
    ///
    /// Thread class.
    pub fn wakeup_one(&self, message: Message) {
        sys::with_locked(|cs| self.wakeup_one_locked(cs, message));
    }

    /// Releases every parked thread from thread context, with an immediate
    /// reschedule check.
    ///
    /// Thread class.
    pub fn wakeup_all(&self, message: Message) {
        sys::with_locked(|cs| self.wakeup_all_locked(cs, message));
    }

    /// The queue's signal balance: pending signals when positive, parked
    /// threads when negative.
    ///
    /// Locked class.
    #[inline]
    pub fn pending_locked(&self, cs: CriticalSection<'_>) -> i32 {
        self.channel.count_locked(cs)
    }

    /// The queue's signal balance, sampled from thread context.
    ///
    /// The value may be stale by the time the caller looks at it; use it
    /// for diagnostics, not decisions.
    ///
    /// Thread class.
    pub fn pending(&self) -> i32 {
        sys::with_locked(|cs| self.pending_locked(cs))
    }
}

impl Default for ThreadQueue {
    fn default() -> Self {
        Self::new()
    }
}
