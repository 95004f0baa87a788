// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! The reference executive for std platforms.
//!
//! The hosted executive maps the single-timeline model onto OS threads:
//!
//! - the critical section is a process-global mutex, so guarded regions
//!   from every thread serialize exactly like a masked-interrupt region;
//! - parking waits on a per-slot condition variable of that same mutex,
//!   which gives the atomic release-and-block that the port contract
//!   demands;
//! - the tick counter is a millisecond clock starting at the first query;
//! - "interrupt context" is a thread-local flag raised by
//!   [`irq_prologue`](crate::sys::irq_prologue), so any OS thread can play
//!   the interrupt controller for a test;
//! - [`halt`](crate::sys::halt) panics, which makes checked precondition
//!   violations observable to `#[should_panic]` tests.
//!
//! Any OS thread that calls into the primitives is an executive thread;
//! there is nothing to register. This is the same strategy the package's
//! own test suite uses.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::cell::Cell;
use std::sync::{Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use super::{Executive, PARK_CAPACITY};

const TICK_HZ: u32 = 1_000;

/// The single execution timeline. Holding this lock is "being in the
/// critical section."
static TIMELINE: Mutex<()> = Mutex::new(());

/// One wakeup channel per waiter slot, all tied to [`TIMELINE`].
static PARKED: [Condvar; PARK_CAPACITY] = [const { Condvar::new() }; PARK_CAPACITY];

static EPOCH: OnceLock<Instant> = OnceLock::new();
static NEXT_TOKEN: AtomicUsize = AtomicUsize::new(0);

std::thread_local! {
    /// The guard for the outermost critical-section level, if this thread
    /// holds one.
    static HELD: Cell<Option<MutexGuard<'static, ()>>> = const { Cell::new(None) };
    /// This thread's critical-section nesting.
    static DEPTH: Cell<u32> = const { Cell::new(0) };
    /// This thread's simulated interrupt nesting.
    static ISR_DEPTH: Cell<u32> = const { Cell::new(0) };
    /// Lazily-assigned thread identity.
    static TOKEN: Cell<usize> = const { Cell::new(usize::MAX) };
}

fn timeline_lock() -> MutexGuard<'static, ()> {
    // A poisoning panic is a halted system, not a broken timeline; later
    // tests in the same process may keep going.
    TIMELINE.lock().unwrap_or_else(PoisonError::into_inner)
}

struct HostedCriticalSection;
critical_section::set_impl!(HostedCriticalSection);

// Safety: acquire blocks until this thread exclusively holds the timeline
// mutex, so at most one thread runs guarded code at a time. Nesting is
// tracked per thread; only the outermost release drops the guard.
unsafe impl critical_section::Impl for HostedCriticalSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        DEPTH.with(|depth| {
            if depth.get() > 0 {
                depth.set(depth.get() + 1);
                false
            } else {
                let guard = timeline_lock();
                HELD.with(|held| held.set(Some(guard)));
                depth.set(1);
                true
            }
        })
    }

    unsafe fn release(outermost: critical_section::RawRestoreState) {
        DEPTH.with(|depth| {
            if outermost {
                depth.set(0);
                HELD.with(|held| drop(held.take()));
            } else {
                depth.set(depth.get() - 1);
            }
        });
    }
}

/// The built-in executive for std platforms.
///
/// Installed automatically by the `hosted` feature, together with a
/// matching `critical-section` implementation. See the
/// [module documentation](self) for the simulation model.
pub struct HostedExecutive;

crate::set_executive!(HostedExecutive);

// Safety: park lends the timeline guard to a condition variable, which
// releases the mutex and blocks in one step and re-locks it before
// returning; unpark notifies the slot's condition variable. Wakeups are
// never lost because the waker only runs while it holds the timeline.
unsafe impl Executive for HostedExecutive {
    fn now() -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        {
            // Wrapping at 2^32 milliseconds is the tick rollover.
            EPOCH.get_or_init(Instant::now).elapsed().as_millis() as u32
        }
    }

    fn frequency() -> u32 {
        TICK_HZ
    }

    fn park(slot: usize, limit: Option<u32>) {
        let Some(guard) = HELD.with(Cell::take) else {
            Self::halt("hosted park, no critical section")
        };
        if DEPTH.with(Cell::get) != 1 {
            Self::halt("hosted park, nested critical section");
        }
        DEPTH.with(|depth| depth.set(0));

        let guard = match limit {
            None => PARKED[slot]
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner),
            Some(ticks) => {
                let millis = u64::from(ticks) * 1_000 / u64::from(TICK_HZ);
                PARKED[slot]
                    .wait_timeout(guard, Duration::from_millis(millis))
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
        };

        DEPTH.with(|depth| depth.set(1));
        HELD.with(|held| held.set(Some(guard)));
    }

    fn unpark(slot: usize) {
        PARKED[slot].notify_all();
    }

    fn reschedule() {
        // The OS scheduler is preemptive; offering the timeslice is the
        // closest analogue of a reschedule check.
        std::thread::yield_now();
    }

    fn thread_token() -> usize {
        TOKEN.with(|token| {
            if token.get() == usize::MAX {
                token.set(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed));
            }
            token.get()
        })
    }

    fn in_interrupt() -> bool {
        ISR_DEPTH.with(Cell::get) > 0
    }

    fn irq_prologue() {
        ISR_DEPTH.with(|depth| depth.set(depth.get() + 1));
    }

    fn irq_epilogue() {
        let outermost = ISR_DEPTH.with(|depth| {
            if depth.get() == 0 {
                Self::halt("hosted irq_epilogue, no prologue");
            }
            depth.set(depth.get() - 1);
            depth.get() == 0
        });
        if outermost {
            std::thread::yield_now();
        }
    }

    fn halt(reason: &str) -> ! {
        panic!("system halted: {reason}");
    }
}
