// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Interlock is the synchronization core of a single-stack, interrupt-driven
//! real-time executive.
//!
//! It provides the primitives that drivers and application threads use to
//! coordinate with interrupt service routines and with each other: critical
//! sections, timed thread suspension and resumption, thread wait queues,
//! event broadcasting, and semaphore-backed mutual exclusion. The scheduler
//! that actually switches threads is *not* part of this package; Interlock
//! talks to it through a narrow port boundary. See [Porting](#porting).
//!
//! # Getting started
//!
//! On a std platform the built-in hosted executive (cargo feature `hosted`,
//! enabled by default) stands in for the scheduler, so the primitives work
//! out of the box:
//!
//! ```
//! use interlock::{event_source::EventSource, queue::ThreadQueue, WaitOption};
//!
//! static READY: EventSource = EventSource::new();
//! static WAITERS: ThreadQueue = ThreadQueue::new();
//!
//! // A producer announces work from thread context.
//! READY.broadcast_flags(0b0100);
//!
//! // Nobody is parked and we refuse to wait, so this times out immediately.
//! assert_eq!(WAITERS.enqueue_timeout(WaitOption::no_wait()), None);
//! ```
//!
//! On a bare-metal target, disable the default features and install your
//! kernel's port before touching any primitive.
//!
//! # Execution contexts
//!
//! Every operation in this package belongs to exactly one calling-context
//! class. The class is part of the public contract, and each operation's
//! documentation names it.
//!
//! - **Thread class**: callable from thread context only. These operations
//!   enter the critical section themselves, may block, and run a reschedule
//!   check before returning. Example: [`mutex::Mutex::lock`].
//! - **Interrupt class** (`*_from_isr`): callable from an interrupt handler
//!   whose body is bracketed by [`sys::irq_prologue`] and
//!   [`sys::irq_epilogue`]. These operations never block and never
//!   reschedule; the epilogue performs one reschedule check for everything
//!   the handler did. Example: [`queue::ThreadQueue::wakeup_one_from_isr`].
//! - **Locked class** (`*_locked`): callable while the critical section is
//!   already held. These operations take a
//!   [`CriticalSection`](critical_section::CriticalSection) token as proof.
//!   The blocking ones (`suspend`, `enqueue`, semaphore waits) additionally
//!   require thread context and a single lock level; they atomically release
//!   the critical section while the thread sleeps.
//!
//! Calling an operation from the wrong context is undefined behavior in a
//! baseline build. With the `checks` feature enabled, violations halt the
//! system with a diagnostic instead.
//!
//! # Timeouts are OK
//!
//! A timeout is not an error; it is exactly what you asked for. Operations
//! that can time out return the timeout in the success path: `Some(message)`
//! means a waker delivered a message, `None` means the deadline elapsed (or
//! that you asked for [`WaitOption::no_wait`] and nothing was pending).
//!
//! # Porting
//!
//! Interlock consumes its scheduler collaborator through two seams:
//!
//! - The raw critical-section enter/exit primitive comes from the
//!   [`critical-section`](critical_section) crate. Your platform must
//!   install an implementation, for example `cortex-m`'s
//!   `critical-section-single-core` or one bridged to your kernel.
//! - Everything else — the tick counter, thread parking, the reschedule
//!   check, interrupt bracketing, and the halt sink — is the
//!   [`port::Executive`] trait. Install yours with [`set_executive!`].
//!
//! The `hosted` feature provides both for std platforms and is how this
//! package tests itself.

#![no_std]
#![warn(
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    let_underscore_drop,
    missing_docs,
    semicolon_in_expressions_from_macros,
    single_use_lifetimes,
    trivial_numeric_casts,
    unsafe_op_in_unsafe_fn,
    unreachable_pub,
    unused_qualifications,
    clippy::cast_possible_truncation,
    clippy::map_unwrap_or,
    clippy::manual_assert,
    clippy::missing_safety_doc,
    clippy::ref_as_ptr,
    clippy::redundant_closure_for_method_calls,
    clippy::semicolon_if_nothing_returned,
    clippy::single_match_else,
    clippy::undocumented_unsafe_blocks,
    clippy::used_underscore_binding
)]

#[cfg(any(test, feature = "hosted"))]
extern crate std;

mod park;

pub mod event_source;
pub mod mutex;
pub mod port;
pub mod queue;
pub mod semaphore;
pub mod sys;
pub mod thread;
pub mod time;

/// How many ticks to wait for an operation.
///
/// This wraps a `u32` that describes the system ticks to wait for an
/// operation to produce a result. Use [`no_wait()`](Self::no_wait) to signal
/// a non-blocking operation, or [`wait_forever()`](Self::wait_forever) to
/// signal an unbounded one.
///
/// You may use ranges `1` through `(!0 - 1)`, inclusive, to specify the
/// number of ticks. A wait option of zero is equivalent to "no wait," and a
/// wait option of `!0` is "wait forever." When the tick counter is 16 bits
/// wide (feature `tick-16`), finite wait options must fit the tick width;
/// larger values are a checked parameter error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct WaitOption(pub u32);

impl WaitOption {
    /// Do not wait for the operation to complete.
    ///
    /// A blocking operation invoked with this option returns its timeout
    /// result synchronously, without ever parking the calling thread.
    pub const fn no_wait() -> Self {
        Self(0)
    }

    /// Returns `true` if constructed via [`no_wait()`](Self::no_wait).
    pub const fn is_no_wait(self) -> bool {
        self.0 == 0
    }

    /// Wait forever for the operation to complete.
    pub const fn wait_forever() -> Self {
        Self(!0)
    }

    /// Returns `true` if constructed via [`wait_forever()`](Self::wait_forever).
    pub const fn is_wait_forever(self) -> bool {
        self.0 == !0
    }

    /// Wait up to `ticks` system ticks.
    ///
    /// Equivalent to `WaitOption(ticks)`; zero and `!0` keep their special
    /// meanings.
    pub const fn ticks(ticks: u32) -> Self {
        Self(ticks)
    }
}

impl From<WaitOption> for u32 {
    fn from(value: WaitOption) -> Self {
        value.0
    }
}

/// A message passed from a waker to a woken thread.
///
/// This wraps a signed integer. [`Message::OK`] denotes normal completion
/// and [`Message::RESET`] is the conventional bulk-release code; every other
/// value is an application-defined payload. The reserved timeout code,
/// [`Message::TIMEOUT`], never reaches safe callers: operations surface a
/// timeout as `None` instead. It exists for applications that forward wake
/// codes over their own protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Message(pub i32);

impl Message {
    /// Normal completion.
    pub const OK: Self = Self(0);

    /// The reserved "deadline elapsed" code.
    ///
    /// Blocking operations in this package report a timeout as `None`
    /// rather than returning this value.
    pub const TIMEOUT: Self = Self(-1);

    /// The conventional code delivered when every waiter of a primitive is
    /// released at once.
    pub const RESET: Self = Self(-2);
}

impl From<Message> for i32 {
    fn from(value: Message) -> Self {
        value.0
    }
}

mod marker {
    use core::marker::PhantomData;

    /// A zero-sized type that's neither `Send` nor `Sync`.
    ///
    /// Use this marker when you have no other way to mark `!Send` or
    /// `!Sync` for your type. This type is valid to construct in a
    /// const context.
    pub(crate) struct NotSendOrSync(PhantomData<*mut ()>);
    impl NotSendOrSync {
        pub(crate) const fn mark() -> Self {
            Self(PhantomData)
        }
    }

    /// A zero-sized type that's not `Send`.
    pub(crate) struct NotSend(NotSendOrSync);
    impl NotSend {
        pub(crate) const fn mark() -> Self {
            Self(NotSendOrSync::mark())
        }
    }

    // Safety: This type introduces Sync to NotSendOrSync, thereby
    // blocking Send.
    unsafe impl Sync for NotSend {}
}
