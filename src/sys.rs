// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! System control services.
//!
//! This module owns the critical section: the non-preemptible region that
//! protects every mutable structure in this package. It exposes three ways
//! in and out, matching the three calling contexts:
//!
//! - [`lock`] / [`unlock`] from thread context;
//! - [`lock_from_isr`] / [`unlock_from_isr`] from an interrupt handler;
//! - [`get_status_and_lock`] / [`restore_status`] from *any* context, at the
//!   cost of carrying an opaque [`SysStatus`] token.
//!
//! The critical section is not reentrant: calling [`lock`] while it is held
//! is a checked error. The capture/restore pair is the exception — it may
//! nest, and only the restore that leaves the critical section entirely
//! runs a reschedule check.
//!
//! Guarded regions run with preemption (and, depending on the platform's
//! `critical-section` implementation, interrupts) suppressed. Keep them
//! short and never block inside one, except through the locked-class
//! suspension operations, which release the critical section while the
//! thread sleeps.
//!
//! # Example
//!
//! ```
//! use interlock::{sys, thread::ThreadReference, Message};
//!
//! static WAITER: ThreadReference = ThreadReference::new();
//!
//! // Compose locked-class operations inside one guarded region.
//! sys::with_locked(|cs| {
//!     WAITER.resume_locked(cs, Message::OK); // Nobody parked: a no-op.
//! });
//! ```
//!
//! Interrupt handlers bracket their body instead:
//!
//! ```
//! use interlock::{sys, queue::ThreadQueue, Message};
//!
//! static RX_WAITERS: ThreadQueue = ThreadQueue::new();
//!
//! fn rx_interrupt_handler() {
//!     sys::irq_prologue();
//!     RX_WAITERS.wakeup_one_from_isr(Message::OK);
//!     sys::irq_epilogue(); // One reschedule check for the whole handler.
//! }
//! # rx_interrupt_handler();
//! ```

use core::cell::Cell;

use critical_section::{CriticalSection, RestoreState};

use crate::port;

/// A cell that may only be touched inside the critical section.
///
/// Since `T: Copy`, this cell has no drop behavior, and every access
/// requires a [`CriticalSection`] token. The token requirement is what
/// justifies the `Sync` implementation.
pub(crate) struct LockedCell<T: Copy>(Cell<T>);

// Safety: all accessors demand a CriticalSection token, so the data is only
// read or written while the system is locked. The critical section serializes
// those accesses across execution contexts.
unsafe impl<T: Copy + Send> Sync for LockedCell<T> {}

impl<T: Copy> LockedCell<T> {
    /// Allocate a cell with an initial value.
    pub(crate) const fn new(value: T) -> Self {
        Self(Cell::new(value))
    }

    pub(crate) fn get(&self, _cs: CriticalSection<'_>) -> T {
        self.0.get()
    }

    pub(crate) fn set(&self, _cs: CriticalSection<'_>, value: T) {
        self.0.set(value);
    }

    pub(crate) fn replace(&self, _cs: CriticalSection<'_>, value: T) -> T {
        self.0.replace(value)
    }
}

/// Halt the system if a checked condition fails.
///
/// Compiled to nothing unless the `checks` feature is enabled. The remark
/// names the operation and the violated precondition.
macro_rules! debug_check {
    ($cond:expr, $remark:expr) => {
        if cfg!(feature = "checks") && !($cond) {
            $crate::sys::halt($remark);
        }
    };
}
pub(crate) use debug_check;

/// The previous lock status captured by [`get_status_and_lock`].
///
/// The encoding is platform-defined and opaque. Pass it, untouched, to
/// [`restore_status`] on the same execution context; the token cannot be
/// sent elsewhere.
pub struct SysStatus {
    prior: RestoreState,
    _not_send: crate::marker::NotSend,
}

/// Saved restore state for the token-less enter/exit pairs.
///
/// At most one token-less lock level exists at a time: the critical section
/// is not reentrant, and an interrupt cannot preempt a locked thread. Both
/// cells are only touched while the critical section is held.
static SAVED: LockedCell<RestoreState> = LockedCell::new(RestoreState::invalid());

/// Current critical-section nesting. Levels above one come only from the
/// capture/restore pair.
static DEPTH: LockedCell<u32> = LockedCell::new(0);

/// Enters the critical section from thread context.
///
/// This function cannot be used for reentrant critical regions: the caller
/// must not already hold the critical section.
#[inline]
pub fn lock() {
    debug_check!(!port::in_interrupt(), "sys::lock(), interrupt context");
    // Safety: balanced by the release in unlock(); the state is kept for
    // exactly this lock level.
    let prior = unsafe { critical_section::acquire() };
    // Safety: acquire() just succeeded, so the critical section is active.
    let cs = unsafe { CriticalSection::new() };
    debug_check!(DEPTH.get(cs) == 0, "sys::lock(), reentry");
    DEPTH.set(cs, 1);
    SAVED.set(cs, prior);
}

/// Leaves the critical section from thread context.
///
/// Runs a reschedule check before releasing, so wakeups signalled inside
/// the guarded region take effect immediately.
#[inline]
pub fn unlock() {
    // Safety: the caller entered through lock(), so the critical section
    // is active.
    let cs = unsafe { CriticalSection::new() };
    debug_check!(DEPTH.get(cs) == 1, "sys::unlock(), not locked");
    port::reschedule();
    DEPTH.set(cs, 0);
    let prior = SAVED.replace(cs, RestoreState::invalid());
    // Safety: `prior` is the state returned by the matching acquire in
    // lock().
    unsafe { critical_section::release(prior) };
}

/// Enters the critical section from an interrupt handler.
///
/// This function cannot be used for reentrant critical regions.
#[inline]
pub fn lock_from_isr() {
    debug_check!(port::in_interrupt(), "sys::lock_from_isr(), thread context");
    // Safety: balanced by the release in unlock_from_isr().
    let prior = unsafe { critical_section::acquire() };
    // Safety: acquire() just succeeded, so the critical section is active.
    let cs = unsafe { CriticalSection::new() };
    debug_check!(DEPTH.get(cs) == 0, "sys::lock_from_isr(), reentry");
    DEPTH.set(cs, 1);
    SAVED.set(cs, prior);
}

/// Leaves the critical section from an interrupt handler.
///
/// Never reschedules: [`irq_epilogue`] performs one reschedule check for
/// everything the handler did.
#[inline]
pub fn unlock_from_isr() {
    // Safety: the caller entered through lock_from_isr(), so the critical
    // section is active.
    let cs = unsafe { CriticalSection::new() };
    debug_check!(DEPTH.get(cs) == 1, "sys::unlock_from_isr(), not locked");
    DEPTH.set(cs, 0);
    let prior = SAVED.replace(cs, RestoreState::invalid());
    // Safety: `prior` is the state returned by the matching acquire in
    // lock_from_isr().
    unsafe { critical_section::release(prior) };
}

/// Returns the current lock status and enters the critical section.
///
/// Callable from any context, including one that already holds the critical
/// section. Because of its flexibility it is less efficient than [`lock`],
/// which is preferable when the calling context is known.
#[inline]
pub fn get_status_and_lock() -> SysStatus {
    // Safety: balanced by the release in restore_status(), which consumes
    // the returned token.
    let prior = unsafe { critical_section::acquire() };
    // Safety: acquire() just succeeded, so the critical section is active.
    let cs = unsafe { CriticalSection::new() };
    DEPTH.set(cs, DEPTH.get(cs) + 1);
    SysStatus {
        prior,
        _not_send: crate::marker::NotSend::mark(),
    }
}

/// Restores the lock status captured by [`get_status_and_lock`].
///
/// When the restore leaves the critical section entirely, and the caller is
/// in thread context, a reschedule check runs before the release. Must be
/// balanced with exactly one prior capture.
#[inline]
pub fn restore_status(status: SysStatus) {
    // Safety: the caller holds the token from get_status_and_lock(), so the
    // critical section is active.
    let cs = unsafe { CriticalSection::new() };
    debug_check!(DEPTH.get(cs) > 0, "sys::restore_status(), not locked");
    let depth = DEPTH.get(cs) - 1;
    DEPTH.set(cs, depth);
    if depth == 0 && !port::in_interrupt() {
        port::reschedule();
    }
    // Safety: `status.prior` came from the matching acquire in
    // get_status_and_lock(); tokens are consumed in reverse capture order
    // per the balancing contract.
    unsafe { critical_section::release(status.prior) };
}

/// Runs `f` inside a thread-context guarded region.
///
/// The closure receives the [`CriticalSection`] token that locked-class
/// operations require. Leaving the region runs the [`unlock`] reschedule
/// check, even if `f` panics.
///
/// Thread class.
pub fn with_locked<R>(f: impl FnOnce(CriticalSection<'_>) -> R) -> R {
    struct Region;
    impl Drop for Region {
        fn drop(&mut self) {
            unlock();
        }
    }

    lock();
    let _region = Region;
    // Safety: lock() entered the critical section, and the Region guard
    // keeps it held for the closure's duration.
    f(unsafe { CriticalSection::new() })
}

/// Runs `f` inside an interrupt-context guarded region.
///
/// Like [`with_locked`], but paired with [`lock_from_isr`] /
/// [`unlock_from_isr`]: no reschedule check runs on exit.
///
/// Interrupt class.
pub fn with_locked_from_isr<R>(f: impl FnOnce(CriticalSection<'_>) -> R) -> R {
    struct Region;
    impl Drop for Region {
        fn drop(&mut self) {
            unlock_from_isr();
        }
    }

    lock_from_isr();
    let _region = Region;
    // Safety: lock_from_isr() entered the critical section, and the Region
    // guard keeps it held for the closure's duration.
    f(unsafe { CriticalSection::new() })
}

/// Checks whether a reschedule is required and performs it.
///
/// Interrupt-class operations invoked from a locked thread context do not
/// reschedule by themselves; call this before leaving the guarded region in
/// that scenario. ([`unlock`] and [`with_locked`] already do.)
///
/// Locked class, thread context.
#[inline]
pub fn reschedule_locked(_cs: CriticalSection<'_>) {
    debug_check!(
        !port::in_interrupt(),
        "sys::reschedule_locked(), interrupt context"
    );
    port::reschedule();
}

/// Marks the entry of an interrupt handler.
///
/// Insert at the start of every interrupt handler that uses interrupt-class
/// operations.
#[inline]
pub fn irq_prologue() {
    port::irq_prologue();
}

/// Marks the exit of an interrupt handler.
///
/// Insert at the end of every interrupt handler. On leaving the outermost
/// interrupt, the port performs a single reschedule check covering every
/// wakeup the handler (and any nested handlers) signalled.
#[inline]
pub fn irq_epilogue() {
    port::irq_epilogue();
}

/// System halt with an error message.
///
/// The port reports `reason` and never returns. This is the sink for every
/// checked precondition violation; there is no recovery path.
#[inline]
pub fn halt(reason: &str) -> ! {
    port::halt(reason)
}

/// Critical-section state carried across a thread's sleep.
///
/// While a thread is parked its token-less lock level conceptually leaves
/// the system: other contexts enter and leave the critical section at will.
/// The parking core swaps this state out before blocking and back in after
/// waking.
pub(crate) struct ParkStash {
    prior: RestoreState,
    depth: u32,
}

pub(crate) fn park_stash_take(cs: CriticalSection<'_>) -> ParkStash {
    ParkStash {
        prior: SAVED.replace(cs, RestoreState::invalid()),
        depth: DEPTH.replace(cs, 0),
    }
}

pub(crate) fn park_stash_put(cs: CriticalSection<'_>, stash: ParkStash) {
    SAVED.set(cs, stash.prior);
    DEPTH.set(cs, stash.depth);
}

/// The current critical-section nesting level.
pub(crate) fn lock_depth(cs: CriticalSection<'_>) -> u32 {
    DEPTH.get(cs)
}
