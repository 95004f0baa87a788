// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Event source services.
//!
//! An [`EventSource`] accumulates event flags — a 32 bit mask, OR-combined
//! by every broadcast — and optionally notifies a callback each time flags
//! are added. Interrupt handlers broadcast completion and error bits;
//! consumers collect them later with [`take_flags`](EventSource::take_flags).
//!
//! Broadcasting never clears anything: the flags persist until a consumer
//! takes them. The callback runs synchronously, *inside* the critical
//! section of the broadcast, so it must be short, non-blocking, and
//! restricted to locked-class operations; its usual job is waking a
//! consumer.
//!
//! # Example
//!
//! ```
//! use interlock::event_source::EventSource;
//!
//! static COMPLETIONS: EventSource = EventSource::new();
//!
//! COMPLETIONS.broadcast_flags(0b0101);
//! COMPLETIONS.broadcast_flags(0b0010);
//!
//! // Flags accumulate, and taking them clears the source.
//! assert_eq!(COMPLETIONS.take_flags(), 0b0111);
//! assert_eq!(COMPLETIONS.peek_flags(), 0);
//! ```
//!
//! A callback turns the source into a wakeup fan-out:
//!
//! ```
//! use critical_section::CriticalSection;
//! use interlock::{event_source::EventSource, queue::ThreadQueue, Message};
//!
//! static WAITERS: ThreadQueue = ThreadQueue::new();
//! static COMPLETIONS: EventSource = EventSource::with_callback(notify, 0);
//!
//! fn notify(cs: CriticalSection<'_>, _source: &EventSource) {
//!     WAITERS.wakeup_all_locked(cs, Message::OK);
//! }
//!
//! COMPLETIONS.broadcast_flags(0b1000); // Also runs `notify`.
//! ```

use critical_section::CriticalSection;

use crate::sys::{self, LockedCell};

/// An event-source notification callback.
///
/// Invoked synchronously by every broadcast, inside the broadcast's
/// critical section — the token is passed along so the callback can
/// compose locked-class operations. The callback must be short,
/// non-blocking, and bounded-time: it runs with preemption suppressed.
pub type EventCallback = fn(CriticalSection<'_>, &EventSource);

/// A broadcast point for event flags.
///
/// To publish flags, use [`broadcast_flags`](Self::broadcast_flags) from a
/// thread or [`broadcast_flags_from_isr`](Self::broadcast_flags_from_isr)
/// from an interrupt handler. To consume them, use
/// [`take_flags`](Self::take_flags), which reads and clears atomically.
///
/// See [the module-level documentation](crate::event_source) for examples.
pub struct EventSource {
    /// OR-accumulated, never cleared by the broadcast path.
    flags: LockedCell<u32>,
    callback: LockedCell<Option<EventCallback>>,
    /// An opaque word for the callback's benefit.
    user_data: LockedCell<usize>,
}

impl EventSource {
    /// Allocates a source with no flags and no callback.
    pub const fn new() -> Self {
        Self {
            flags: LockedCell::new(0),
            callback: LockedCell::new(None),
            user_data: LockedCell::new(0),
        }
    }

    /// Allocates a source that notifies `callback` on every broadcast.
    ///
    /// `user_data` is kept for the callback; read it back with
    /// [`user_data_locked`](Self::user_data_locked).
    pub const fn with_callback(callback: EventCallback, user_data: usize) -> Self {
        Self {
            flags: LockedCell::new(0),
            callback: LockedCell::new(Some(callback)),
            user_data: LockedCell::new(user_data),
        }
    }

    /// Replaces the notification callback and user word.
    ///
    /// Locked class.
    pub fn set_callback_locked(
        &self,
        cs: CriticalSection<'_>,
        callback: Option<EventCallback>,
        user_data: usize,
    ) {
        self.callback.set(cs, callback);
        self.user_data.set(cs, user_data);
    }

    /// The user word registered with the callback.
    ///
    /// Locked class; meant for use from inside the callback.
    #[inline]
    pub fn user_data_locked(&self, cs: CriticalSection<'_>) -> usize {
        self.user_data.get(cs)
    }

    /// ORs `flags` into the source, then notifies the callback.
    ///
    /// The callback (if any) runs synchronously, still inside the critical
    /// section, once per broadcast.
    ///
    /// Locked class; never blocks, never reschedules.
    pub fn broadcast_flags_locked(&self, cs: CriticalSection<'_>, flags: u32) {
        self.flags.set(cs, self.flags.get(cs) | flags);
        if let Some(callback) = self.callback.get(cs) {
            callback(cs, self);
        }
    }

    /// Broadcasts flags from an interrupt handler.
    ///
    /// The handler's [`irq_epilogue`](crate::sys::irq_epilogue) performs
    /// the reschedule check for any thread the callback woke.
    ///
    /// Interrupt class.
    pub fn broadcast_flags_from_isr(&self, flags: u32) {
        sys::with_locked_from_isr(|cs| self.broadcast_flags_locked(cs, flags));
    }

    /// Broadcasts flags from thread context, with an immediate reschedule
    /// check.
    ///
    /// Thread class.
    pub fn broadcast_flags(&self, flags: u32) {
        sys::with_locked(|cs| self.broadcast_flags_locked(cs, flags));
    }

    /// Reads and clears the accumulated flags in one step.
    ///
    /// Locked class.
    #[inline]
    pub fn take_flags_locked(&self, cs: CriticalSection<'_>) -> u32 {
        self.flags.replace(cs, 0)
    }

    /// Reads the accumulated flags without clearing them.
    ///
    /// Locked class.
    #[inline]
    pub fn peek_flags_locked(&self, cs: CriticalSection<'_>) -> u32 {
        self.flags.get(cs)
    }

    /// Reads and clears the accumulated flags from thread context.
    ///
    /// Thread class.
    pub fn take_flags(&self) -> u32 {
        sys::with_locked(|cs| self.take_flags_locked(cs))
    }

    /// Reads the accumulated flags from thread context.
    ///
    /// The value may be stale by the time the caller looks at it.
    ///
    /// Thread class.
    pub fn peek_flags(&self) -> u32 {
        sys::with_locked(|cs| self.peek_flags_locked(cs))
    }
}

impl Default for EventSource {
    fn default() -> Self {
        Self::new()
    }
}
