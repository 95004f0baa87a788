// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Timebase services.
//!
//! The executive counts time in *ticks*: a monotonic counter that starts at
//! zero, advances at the port-defined [`frequency`], and silently wraps at
//! the end of its range. The counter is [`Tick`] — 32 bits wide by default,
//! 16 bits with the `tick-16` feature.
//!
//! Because the counter wraps, comparing tick values with `<` is meaningless.
//! Use [`is_time_within`], which treats its operands as points on the
//! wrapping ring.
//!
//! # Example
//!
//! ```
//! use interlock::time::{self, Tick};
//!
//! let start = time::now();
//! let deadline = start.wrapping_add(100);
//!
//! // Wrap-aware deadline check, valid even if the counter rolled over.
//! if !time::is_time_within(time::now(), start, deadline) {
//!     // ... the deadline elapsed ...
//! }
//! ```

use crate::port;
use crate::sys::debug_check;

/// The system tick counter type.
///
/// 32 bits wide, or 16 bits when the `tick-16` feature is enabled. All tick
/// arithmetic wraps.
#[cfg(not(feature = "tick-16"))]
pub type Tick = u32;

/// The system tick counter type.
///
/// 32 bits wide, or 16 bits when the `tick-16` feature is enabled. All tick
/// arithmetic wraps.
#[cfg(feature = "tick-16")]
pub type Tick = u16;

/// Current system time.
///
/// Returns the number of ticks since the executive started. The counter can
/// reach its maximum and then restart from zero.
///
/// This function can be called from any context, but its atomicity is not
/// guaranteed on platforms whose word size is smaller than [`Tick`].
#[inline]
pub fn now() -> Tick {
    #[allow(clippy::cast_possible_truncation)]
    {
        // Truncation is the point: the counter lives on a ring of the
        // configured tick width.
        port::now() as Tick
    }
}

/// The number of ticks per second, as reported by the port.
#[inline]
pub fn frequency() -> u32 {
    port::frequency()
}

/// Checks whether `time` lies within the window `[start, end)`.
///
/// All three values are points on the wrapping tick ring, so the window may
/// straddle the counter rollover. When `start == end` the window is the
/// *entire* ring and the result is always `true`; a half-open window cannot
/// otherwise express "everything".
///
/// This function can be called from any context.
///
/// ```
/// use interlock::time::is_time_within;
///
/// assert!(is_time_within(5, 3, 10));
/// assert!(!is_time_within(10, 3, 10)); // The end is exclusive.
/// assert!(is_time_within(7, 7, 7)); // Empty bounds mean the whole ring.
/// ```
#[inline]
pub fn is_time_within(time: Tick, start: Tick, end: Tick) -> bool {
    if start == end {
        return true;
    }
    time.wrapping_sub(start) < end.wrapping_sub(start)
}

/// Converts seconds to ticks, rounding up to the next tick boundary.
///
/// The result must fit the tick width; overflow is a checked parameter
/// error.
#[inline]
pub fn ticks_from_secs(secs: u32) -> Tick {
    ticks_from(u64::from(secs) * u64::from(port::frequency()))
}

/// Converts milliseconds to ticks, rounding up to the next tick boundary.
///
/// The result must fit the tick width; overflow is a checked parameter
/// error.
#[inline]
pub fn ticks_from_millis(millis: u32) -> Tick {
    ticks_from((u64::from(millis) * u64::from(port::frequency())).div_ceil(1_000))
}

/// Converts microseconds to ticks, rounding up to the next tick boundary.
///
/// The result must fit the tick width; overflow is a checked parameter
/// error.
#[inline]
pub fn ticks_from_micros(micros: u32) -> Tick {
    ticks_from((u64::from(micros) * u64::from(port::frequency())).div_ceil(1_000_000))
}

fn ticks_from(ticks: u64) -> Tick {
    debug_check!(ticks <= Tick::MAX as u64, "time::ticks_from(), tick overflow");
    #[allow(clippy::cast_possible_truncation)]
    {
        ticks as Tick
    }
}
