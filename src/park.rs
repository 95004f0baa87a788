// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! The parking core.
//!
//! Every way a thread can sleep in this package — a suspend/resume
//! reference, a semaphore wait, a queue enqueue, a timed sleep — funnels
//! into one arena of waiter slots. A slot walks a small state machine:
//!
//! ```text
//! Free -> Waiting -> Delivered -> Free        (an explicit wakeup won)
//! Free -> Waiting -> Free                     (the timeout won)
//! ```
//!
//! Both transitions out of `Waiting` happen inside the critical section, so
//! the race between a timeout and an explicit wakeup always has exactly one
//! winner: a waker only delivers to a slot that is still `Waiting`, and a
//! timed-out waiter only gives up on a slot that was never `Delivered`.
//!
//! Slots carry an intrusive link so that a semaphore can keep its waiters
//! in FIFO order without extra storage.

use critical_section::CriticalSection;

use crate::port::{self, PARK_CAPACITY};
use crate::sys::{self, debug_check, LockedCell};
use crate::time::{self, Tick};
use crate::{Message, WaitOption};

/// The "no slot" sentinel for slot handles and intrusive links.
pub(crate) const NONE: u8 = u8::MAX;

const _: () = assert!(PARK_CAPACITY < NONE as usize);

#[derive(Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    Waiting,
    Delivered,
}

struct Slot {
    state: LockedCell<SlotState>,
    message: LockedCell<i32>,
    next: LockedCell<u8>,
}

impl Slot {
    const fn new() -> Self {
        Self {
            state: LockedCell::new(SlotState::Free),
            message: LockedCell::new(0),
            next: LockedCell::new(NONE),
        }
    }
}

static ARENA: [Slot; PARK_CAPACITY] = [const { Slot::new() }; PARK_CAPACITY];

/// Claims a free slot for the calling thread and marks it `Waiting`.
///
/// Running out of slots means more threads are suspended than
/// [`PARK_CAPACITY`] allows for; that is a configuration error, so the
/// system halts.
pub(crate) fn allocate(cs: CriticalSection<'_>) -> u8 {
    for (index, slot) in ARENA.iter().enumerate() {
        if slot.state.get(cs) == SlotState::Free {
            slot.state.set(cs, SlotState::Waiting);
            slot.next.set(cs, NONE);
            #[allow(clippy::cast_possible_truncation)]
            {
                // PARK_CAPACITY fits u8; see the const assertion above.
                return index as u8;
            }
        }
    }
    sys::halt("park::allocate(), waiter arena exhausted")
}

/// Returns a slot to the arena.
pub(crate) fn release(cs: CriticalSection<'_>, slot: u8) {
    ARENA[usize::from(slot)].state.set(cs, SlotState::Free);
}

/// Delivers `message` to a `Waiting` slot and wakes its thread.
///
/// The caller guarantees the slot is `Waiting`: a slot handle only reaches
/// a waker through a reference cell or wait list, and the timeout path
/// detaches from those before giving the slot up.
pub(crate) fn deliver(cs: CriticalSection<'_>, slot: u8, message: Message) {
    let entry = &ARENA[usize::from(slot)];
    debug_assert!(entry.state.get(cs) == SlotState::Waiting);
    entry.state.set(cs, SlotState::Delivered);
    entry.message.set(cs, message.0);
    port::unpark(usize::from(slot));
}

/// Parks the calling thread on `slot` until a delivery or the timeout.
///
/// Returns the delivered message, or `None` if the wait timed out. Either
/// way the slot is *not* released: the caller first detaches it from
/// whatever structure named it, then calls [`release`].
///
/// The caller is in thread context, holds the critical section at exactly
/// one level, and has already handled the "no wait" option.
pub(crate) fn wait_here(cs: CriticalSection<'_>, slot: u8, wait: WaitOption) -> Option<Message> {
    debug_check!(!port::in_interrupt(), "park::wait_here(), interrupt context");
    debug_check!(
        sys::lock_depth(cs) == 1,
        "park::wait_here(), nested critical section"
    );

    let index = usize::from(slot);
    let state = &ARENA[index].state;

    // The thread is about to leave the timeline; its token-less lock level
    // goes with it and comes back once the port re-enters the critical
    // section.
    let stash = sys::park_stash_take(cs);

    let delivered = if wait.is_wait_forever() {
        while state.get(cs) != SlotState::Delivered {
            port::park(index, None);
        }
        true
    } else {
        let total = ticks_from_wait(wait);
        let start = time::now();
        let deadline = start.wrapping_add(total);
        loop {
            if state.get(cs) == SlotState::Delivered {
                break true;
            }
            let now = time::now();
            if !time::is_time_within(now, start, deadline) {
                break false;
            }
            port::park(index, Some(u32::from(deadline.wrapping_sub(now))));
        }
    };

    sys::park_stash_put(cs, stash);

    delivered.then(|| Message(ARENA[index].message.get(cs)))
}

fn ticks_from_wait(wait: WaitOption) -> Tick {
    debug_check!(
        u64::from(wait.0) <= Tick::MAX as u64,
        "park::wait_here(), timeout exceeds tick range"
    );
    #[allow(clippy::cast_possible_truncation)]
    {
        wait.0 as Tick
    }
}

/// A FIFO of `Waiting` slots, linked through the arena.
pub(crate) struct WaitList {
    head: LockedCell<u8>,
    tail: LockedCell<u8>,
}

impl WaitList {
    pub(crate) const fn new() -> Self {
        Self {
            head: LockedCell::new(NONE),
            tail: LockedCell::new(NONE),
        }
    }

    /// Appends a slot as the newest waiter.
    pub(crate) fn push_back(&self, cs: CriticalSection<'_>, slot: u8) {
        ARENA[usize::from(slot)].next.set(cs, NONE);
        let tail = self.tail.replace(cs, slot);
        if tail == NONE {
            self.head.set(cs, slot);
        } else {
            ARENA[usize::from(tail)].next.set(cs, slot);
        }
    }

    /// Removes and returns the longest-waiting slot.
    pub(crate) fn pop_front(&self, cs: CriticalSection<'_>) -> Option<u8> {
        let head = self.head.get(cs);
        if head == NONE {
            return None;
        }
        let next = ARENA[usize::from(head)].next.replace(cs, NONE);
        self.head.set(cs, next);
        if next == NONE {
            self.tail.set(cs, NONE);
        }
        Some(head)
    }

    /// Detaches `slot` wherever it sits in the list.
    ///
    /// Used by the timeout path; the list is as short as the number of
    /// parked threads, so a scan is fine.
    pub(crate) fn unlink(&self, cs: CriticalSection<'_>, slot: u8) {
        let mut previous = NONE;
        let mut current = self.head.get(cs);
        while current != NONE {
            let next = ARENA[usize::from(current)].next.get(cs);
            if current == slot {
                if previous == NONE {
                    self.head.set(cs, next);
                } else {
                    ARENA[usize::from(previous)].next.set(cs, next);
                }
                if next == NONE {
                    self.tail.set(cs, previous);
                }
                ARENA[usize::from(current)].next.set(cs, NONE);
                return;
            }
            previous = current;
            current = next;
        }
    }
}
