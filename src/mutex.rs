// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Mutex services.
//!
//! A [`Mutex`] provides mutual exclusion built on a [`Semaphore`] holding a
//! single permit. Locking consumes the permit, blocking while another
//! thread holds it; unlocking returns it, releasing the longest-waiting
//! thread first.
//!
//! # Lock ordering
//!
//! A thread that holds several mutexes must release them in exact reverse
//! order of acquisition: the mutex being unlocked must be the last one the
//! thread locked. [`unlock`](Mutex::unlock) *trusts* this discipline — the
//! semaphore underneath has no notion of an owner — so a caller that breaks
//! it silently corrupts the exclusion in a baseline build. With the
//! `checks` feature enabled, the package keeps an explicit per-thread stack
//! of held mutexes and halts on the first violation.
//!
//! [`with_lock`](Mutex::with_lock) makes the discipline structural; prefer
//! it where the critical region is a neat scope.
//!
//! # Example
//!
//! ```
//! use interlock::mutex::Mutex;
//!
//! static BUS: Mutex = Mutex::new();
//! static REGISTRY: Mutex = Mutex::new();
//!
//! BUS.lock();
//! REGISTRY.lock();
//! // ... the guarded work ...
//! REGISTRY.unlock(); // Reverse order: last locked, first unlocked.
//! BUS.unlock();
//!
//! assert!(BUS.try_lock());
//! BUS.unlock();
//! ```

use crate::semaphore::Semaphore;
use crate::sys;
use crate::WaitOption;

/// A mutual-exclusion lock over a one-permit semaphore.
///
/// To acquire, use [`lock`](Self::lock), [`try_lock`](Self::try_lock), or
/// [`lock_timeout`](Self::lock_timeout); to release, [`unlock`](Self::unlock),
/// honoring the reverse-order contract described in
/// [the module-level documentation](crate::mutex).
///
/// All mutex operations are thread class: a mutex is never touched from an
/// interrupt handler.
pub struct Mutex {
    permit: Semaphore,
}

impl Mutex {
    /// Allocates an unlocked mutex: one available permit.
    pub const fn new() -> Self {
        Self {
            permit: Semaphore::new(1),
        }
    }

    /// Acquires the mutex, blocking until the permit is available.
    ///
    /// The mutex joins the top of the calling thread's conceptual
    /// held-mutex stack; release in reverse order.
    ///
    /// Thread class.
    pub fn lock(&self) {
        sys::with_locked(|cs| {
            let _ = self.permit.wait_locked(cs);
            #[cfg(feature = "checks")]
            ledger::push(cs, core::ptr::from_ref(self) as usize);
        });
    }

    /// Acquires the mutex only if the permit is immediately available.
    ///
    /// Returns `true` on acquisition. Never blocks.
    ///
    /// Thread class.
    pub fn try_lock(&self) -> bool {
        self.lock_timeout(WaitOption::no_wait())
    }

    /// Acquires the mutex, giving up once the wait option expires.
    ///
    /// Returns `true` on acquisition, `false` on timeout.
    ///
    /// Thread class.
    pub fn lock_timeout(&self, wait: WaitOption) -> bool {
        sys::with_locked(|cs| {
            let acquired = self.permit.wait_timeout_locked(cs, wait).is_some();
            #[cfg(feature = "checks")]
            if acquired {
                ledger::push(cs, core::ptr::from_ref(self) as usize);
            }
            acquired
        })
    }

    /// Releases the mutex, waking the longest-waiting locker.
    ///
    /// The caller must be releasing its most recently locked mutex; the
    /// implementation trusts that and simply returns the permit. Checked
    /// builds halt when the discipline is broken.
    ///
    /// Thread class.
    pub fn unlock(&self) {
        sys::with_locked(|cs| {
            #[cfg(feature = "checks")]
            ledger::pop(cs, core::ptr::from_ref(self) as usize);
            self.permit.signal_locked(cs);
        });
    }

    /// Runs `f` with the mutex held.
    ///
    /// Acquisition and release wrap the closure, so the reverse-order
    /// contract holds structurally — including when `f` panics.
    ///
    /// Thread class.
    pub fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        struct Guard<'m>(&'m Mutex);
        impl Drop for Guard<'_> {
            fn drop(&mut self) {
                self.0.unlock();
            }
        }

        self.lock();
        let _guard = Guard(self);
        f()
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-thread stack of held mutexes.
///
/// The scheduler knows nothing about lock ordering, so checked builds keep
/// the ownership stacks here: one row per thread, claimed on first use and
/// keyed by the port's thread token.
#[cfg(feature = "checks")]
mod ledger {
    use critical_section::CriticalSection;

    use crate::port;
    use crate::sys::{self, LockedCell};

    const MAX_THREADS: usize = 16;
    const MAX_HELD: usize = 8;
    const VACANT: usize = usize::MAX;

    struct Row {
        token: LockedCell<usize>,
        depth: LockedCell<usize>,
        held: [LockedCell<usize>; MAX_HELD],
    }

    impl Row {
        const fn new() -> Self {
            Self {
                token: LockedCell::new(VACANT),
                depth: LockedCell::new(0),
                held: [const { LockedCell::new(0) }; MAX_HELD],
            }
        }
    }

    static ROWS: [Row; MAX_THREADS] = [const { Row::new() }; MAX_THREADS];

    fn row(cs: CriticalSection<'_>) -> &'static Row {
        let token = port::thread_token();
        for row in &ROWS {
            if row.token.get(cs) == token {
                return row;
            }
        }
        for row in &ROWS {
            if row.token.get(cs) == VACANT {
                row.token.set(cs, token);
                return row;
            }
        }
        sys::halt("mutex ledger, too many threads")
    }

    pub(super) fn push(cs: CriticalSection<'_>, mutex: usize) {
        let row = row(cs);
        let depth = row.depth.get(cs);
        if depth == MAX_HELD {
            sys::halt("mutex ledger, held-mutex stack overflow");
        }
        row.held[depth].set(cs, mutex);
        row.depth.set(cs, depth + 1);
    }

    pub(super) fn pop(cs: CriticalSection<'_>, mutex: usize) {
        let row = row(cs);
        let depth = row.depth.get(cs);
        if depth == 0 {
            sys::halt("mutex unlock, no mutex held");
        }
        if row.held[depth - 1].get(cs) != mutex {
            sys::halt("mutex unlock, out of lock order");
        }
        row.depth.set(cs, depth - 1);
    }
}
