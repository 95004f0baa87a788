// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 Interlock project developers

//! Wrap-aware time window semantics and tick conversions.

use interlock::time::{
    is_time_within, now, ticks_from_micros, ticks_from_millis, ticks_from_secs, Tick,
};

#[test]
fn equal_bounds_cover_the_entire_ring() {
    for start in [0, 1, 77, Tick::MAX / 2, Tick::MAX] {
        for time in [0, 1, start, start.wrapping_sub(1), start.wrapping_add(1), Tick::MAX] {
            assert!(
                is_time_within(time, start, start),
                "time {time} should lie in the whole-ring window at {start}"
            );
        }
    }
}

#[test]
fn plain_window() {
    assert!(is_time_within(3, 3, 10));
    assert!(is_time_within(9, 3, 10));
    assert!(!is_time_within(10, 3, 10));
    assert!(!is_time_within(2, 3, 10));
    assert!(!is_time_within(Tick::MAX, 3, 10));
}

#[test]
fn window_across_the_rollover() {
    // The window [MAX - 5, 5) straddles the counter rollover.
    let start = Tick::MAX - 5;
    let end = 5;

    assert!(is_time_within(2, start, end));
    assert!(is_time_within(start, start, end));
    assert!(is_time_within(Tick::MAX, start, end));
    assert!(is_time_within(0, start, end));
    assert!(!is_time_within(10, start, end));
    assert!(!is_time_within(5, start, end));
    assert!(!is_time_within(start.wrapping_sub(1), start, end));
}

#[test]
fn forward_arc_matches_wrapping_distance() {
    // For unequal bounds, membership is exactly "the wrapping distance from
    // start to time is shorter than the wrapping distance from start to end."
    let cases: [(Tick, Tick, Tick); 4] = [
        (0, 10, 0),
        (55, 50, 60),
        (Tick::MAX, Tick::MAX - 10, 3),
        (1, Tick::MAX - 2, 7),
    ];
    for (time, start, end) in cases {
        let expected = time.wrapping_sub(start) < end.wrapping_sub(start);
        assert_eq!(is_time_within(time, start, end), expected);
    }
}

#[test]
fn the_clock_advances() {
    let first = now();
    let deadline = std::time::Instant::now();
    while now() == first {
        assert!(
            deadline.elapsed() < std::time::Duration::from_secs(5),
            "tick counter never advanced"
        );
        std::thread::yield_now();
    }
}

#[test]
fn conversions_round_up() {
    // The hosted tick runs at 1 kHz.
    assert_eq!(interlock::time::frequency(), 1_000);

    assert_eq!(ticks_from_millis(0), 0);
    assert_eq!(ticks_from_millis(1), 1);
    assert_eq!(ticks_from_millis(250), 250);

    assert_eq!(ticks_from_secs(2), 2_000);

    // A fraction of a tick still costs a full tick.
    assert_eq!(ticks_from_micros(1), 1);
    assert_eq!(ticks_from_micros(1_000), 1);
    assert_eq!(ticks_from_micros(1_001), 2);
}
