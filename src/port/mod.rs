// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! The executive port: the seam between this package and your scheduler.
//!
//! Interlock never switches threads itself. Whenever a primitive needs the
//! scheduler — to read the tick counter, to put the calling thread to sleep,
//! to make a sleeping thread runnable, or to run a reschedule check — it
//! calls through the [`Executive`] trait. Exactly one implementation must be
//! installed per program with [`set_executive!`](crate::set_executive).
//!
//! The raw critical-section primitive is *not* part of this trait; it comes
//! from the [`critical-section`](critical_section) crate, whose
//! implementation your platform installs separately. A kernel port will
//! usually provide both from the same crate.
//!
//! The `hosted` cargo feature installs the built-in [`HostedExecutive`] and
//! a matching critical-section implementation, mapping the executive onto
//! OS threads. That is how this package tests itself, and it is a practical
//! way to prototype drivers on a workstation.
//!
//! # Installing a port
//!
//! ```ignore
//! struct MyKernel;
//!
//! unsafe impl interlock::port::Executive for MyKernel {
//!     // ...
//! }
//!
//! interlock::set_executive!(MyKernel);
//! ```

#[cfg(feature = "hosted")]
mod hosted;

#[cfg(feature = "hosted")]
pub use hosted::HostedExecutive;

/// The number of waiter slots in the parking arena.
///
/// This bounds how many threads may be suspended on Interlock primitives at
/// the same time. [`Executive::park`] and [`Executive::unpark`] receive slot
/// indices below this value.
pub const PARK_CAPACITY: usize = 32;

/// The scheduler collaborator consumed by every primitive in this package.
///
/// Implement this on a zero-sized type and install it with
/// [`set_executive!`](crate::set_executive).
///
/// # Safety
///
/// The package builds its blocking and wakeup semantics on this contract;
/// an implementation that violates it breaks memory safety for every user
/// of the synchronization primitives. In particular:
///
/// - [`park`](Self::park) is called from thread context with the critical
///   section held at exactly one level. It must atomically release the
///   critical section as the thread blocks, and re-enter it before
///   returning. Returning without a wakeup (spuriously, or because the
///   limit elapsed) is fine; the core re-checks its own state.
/// - [`unpark`](Self::unpark) is called with the critical section held, from
///   any context. It must make the thread parked on the slot runnable
///   without blocking and without a reschedule, even if that thread has not
///   finished blocking yet (the wakeup must not be lost).
/// - [`in_interrupt`](Self::in_interrupt) must be accurate for the calling
///   context whenever interrupt brackets are used as documented.
pub unsafe trait Executive {
    /// Read the raw tick counter.
    ///
    /// Called from any context. The core truncates the value to the
    /// configured [`Tick`](crate::time::Tick) width, so a free-running
    /// wider counter is fine.
    fn now() -> u32;

    /// The tick frequency in ticks per second.
    ///
    /// Used by the time-conversion helpers and by ports that map tick
    /// limits onto wall-clock waits.
    fn frequency() -> u32;

    /// Suspend the calling thread on a waiter slot.
    ///
    /// Called from thread context with the critical section held at exactly
    /// one level. The implementation must atomically release the critical
    /// section while the thread blocks and re-enter it before returning.
    ///
    /// `limit` is the maximum number of ticks to stay suspended; `None`
    /// means no limit. Spurious returns are permitted: the core loops until
    /// its slot is delivered or its own deadline passes.
    fn park(slot: usize, limit: Option<u32>);

    /// Make the thread parked on `slot` runnable.
    ///
    /// Called with the critical section held, from any context. Must not
    /// block and must not reschedule. A wakeup for a thread that is still
    /// entering its blocked state must not be lost.
    fn unpark(slot: usize);

    /// Reschedule check: switch threads now if a higher-priority thread
    /// became runnable.
    ///
    /// Called with the critical section held, from thread context or from
    /// the outermost interrupt epilogue.
    fn reschedule();

    /// A stable identity for the calling thread.
    ///
    /// Only consulted by instrumentation (the held-mutex ledger). Any value
    /// that is unique per thread and constant for its lifetime works,
    /// except `usize::MAX`, which the ledger reserves as a sentinel.
    fn thread_token() -> usize;

    /// Returns `true` when the calling context is an interrupt handler.
    fn in_interrupt() -> bool;

    /// An interrupt handler entered. See [`sys::irq_prologue`](crate::sys::irq_prologue).
    fn irq_prologue();

    /// An interrupt handler is about to return.
    ///
    /// On leaving the outermost interrupt, the implementation performs the
    /// single batched reschedule check for every wakeup the handler
    /// signalled. See [`sys::irq_epilogue`](crate::sys::irq_epilogue).
    fn irq_epilogue();

    /// Unrecoverable fault: report `reason` and stop the system.
    fn halt(reason: &str) -> !;
}

/// Installs the program's [`Executive`](crate::port::Executive).
///
/// Call once, at crate level, in the binary (or board-support crate) that
/// owns the port:
///
/// ```ignore
/// interlock::set_executive!(MyKernel);
/// ```
///
/// Linking fails if no executive is installed, and duplicate-symbol errors
/// arise if two are.
#[macro_export]
macro_rules! set_executive {
    ($executive:ty) => {
        const _: () = {
            #[no_mangle]
            fn _interlock_executive_now() -> u32 {
                <$executive as $crate::port::Executive>::now()
            }
            #[no_mangle]
            fn _interlock_executive_frequency() -> u32 {
                <$executive as $crate::port::Executive>::frequency()
            }
            #[no_mangle]
            fn _interlock_executive_park(slot: usize, limit: Option<u32>) {
                <$executive as $crate::port::Executive>::park(slot, limit);
            }
            #[no_mangle]
            fn _interlock_executive_unpark(slot: usize) {
                <$executive as $crate::port::Executive>::unpark(slot);
            }
            #[no_mangle]
            fn _interlock_executive_reschedule() {
                <$executive as $crate::port::Executive>::reschedule();
            }
            #[no_mangle]
            fn _interlock_executive_thread_token() -> usize {
                <$executive as $crate::port::Executive>::thread_token()
            }
            #[no_mangle]
            fn _interlock_executive_in_interrupt() -> bool {
                <$executive as $crate::port::Executive>::in_interrupt()
            }
            #[no_mangle]
            fn _interlock_executive_irq_prologue() {
                <$executive as $crate::port::Executive>::irq_prologue();
            }
            #[no_mangle]
            fn _interlock_executive_irq_epilogue() {
                <$executive as $crate::port::Executive>::irq_epilogue();
            }
            #[no_mangle]
            fn _interlock_executive_halt(reason: &str) -> ! {
                <$executive as $crate::port::Executive>::halt(reason)
            }
        };
    };
}

extern "Rust" {
    fn _interlock_executive_now() -> u32;
    fn _interlock_executive_frequency() -> u32;
    fn _interlock_executive_park(slot: usize, limit: Option<u32>);
    fn _interlock_executive_unpark(slot: usize);
    fn _interlock_executive_reschedule();
    fn _interlock_executive_thread_token() -> usize;
    fn _interlock_executive_in_interrupt() -> bool;
    fn _interlock_executive_irq_prologue();
    fn _interlock_executive_irq_epilogue();
    fn _interlock_executive_halt(reason: &str) -> !;
}

// The crate-internal face of the installed executive. Every call site in
// the core routes through these shims.

pub(crate) fn now() -> u32 {
    // Safety: the symbol is defined by set_executive!, with this exact
    // signature, in the program's port.
    unsafe { _interlock_executive_now() }
}

pub(crate) fn frequency() -> u32 {
    // Safety: see now().
    unsafe { _interlock_executive_frequency() }
}

pub(crate) fn park(slot: usize, limit: Option<u32>) {
    // Safety: see now().
    unsafe { _interlock_executive_park(slot, limit) }
}

pub(crate) fn unpark(slot: usize) {
    // Safety: see now().
    unsafe { _interlock_executive_unpark(slot) }
}

pub(crate) fn reschedule() {
    // Safety: see now().
    unsafe { _interlock_executive_reschedule() }
}

pub(crate) fn thread_token() -> usize {
    // Safety: see now().
    unsafe { _interlock_executive_thread_token() }
}

pub(crate) fn in_interrupt() -> bool {
    // Safety: see now().
    unsafe { _interlock_executive_in_interrupt() }
}

pub(crate) fn irq_prologue() {
    // Safety: see now().
    unsafe { _interlock_executive_irq_prologue() }
}

pub(crate) fn irq_epilogue() {
    // Safety: see now().
    unsafe { _interlock_executive_irq_epilogue() }
}

pub(crate) fn halt(reason: &str) -> ! {
    // Safety: see now().
    unsafe { _interlock_executive_halt(reason) }
}
