// Implements the FrequencyEstimator, reducing the trigger log to an edge rate in Hz.

// Key Features:
// - Averages every interval inside the validity window instead of the last gap alone.
// - Rejects stale, never-written and concurrently overwritten slots.
// - Walk is bounded by the log capacity and never crosses back past the write head.
// - All degenerate cases (no data, single edge, zero span) yield exactly 0 Hz.

// Detailed Operation:
// The estimator snapshots the write head, then samples the clock. Starting from the newest
// slot it walks backward through the ring, accepting slots while they are written, younger
// than the validity window and not newer than the slot accepted before them. The last
// slot visited is the oldest one (the slot at the head), so a full log contributes all of
// its intervals. The rate is 1e6 divided by the mean interval between the newest and the
// oldest accepted timestamps. A longer window or a larger log smooths jitter at the cost of
// reacting later to speed changes.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use super::trigger_log::{TriggerLog, EMPTY};
use crate::clock::Clock;

/// Clock ticks per second (microsecond timebase)
pub const TICKS_PER_SECOND: f32 = 1_000_000.0;

/// Default validity window in microseconds
pub const DEFAULT_VALID_WINDOW_US: u32 = 100_000;

/// Range of the log accepted for estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidSpan {
    pub earliest: usize, // Oldest accepted slot index
    pub latest: usize,   // Newest slot index
    pub time_us: u32,    // Timestamp difference between them
    pub steps: usize,    // Intervals covered (circular distance earliest -> latest)
}

pub struct FrequencyEstimator {
    valid_window_us: u32, // Maximum age of a usable timestamp
}

impl FrequencyEstimator {
    pub const fn new(valid_window_us: u32) -> Self {
        Self { valid_window_us }
    }

    /// Edge rate in Hz, 0.0 when fewer than two fresh edges are available.
    pub fn estimate<C: Clock, const N: usize>(&self, log: &TriggerLog<N>, clock: &C) -> f32 {
        let span = match self.valid_span(log, clock) {
            Some(span) => span,
            None => return 0.0,
        };

        let avg_interval = span.time_us as f32 / span.steps as f32;

        // Edges too close to resolve with the clock
        if avg_interval == 0.0 {
            return 0.0;
        }

        TICKS_PER_SECOND / avg_interval
    }

    /// Locates the newest run of fresh timestamps, None if it holds fewer than two edges.
    pub fn valid_span<C: Clock, const N: usize>(
        &self,
        log: &TriggerLog<N>,
        clock: &C,
    ) -> Option<ValidSpan> {
        // Head first: any edge landing after this point only touches the slot at the head
        let head = log.head();
        let now = clock.now_us();

        let latest = TriggerLog::<N>::latest_index(head);
        let mut latest_stamp = EMPTY;
        let mut earliest = latest;
        let mut earliest_stamp = EMPTY;
        let mut prev_age = 0u32;

        for back in 0..N {
            let idx = TriggerLog::<N>::wrap_back(latest, back);
            let stamp = log.slot(idx);
            let age = now.wrapping_sub(stamp);

            // Unwritten, stale, or rewritten by the producer during this walk
            if stamp == EMPTY || age > self.valid_window_us || age < prev_age {
                break;
            }

            // Each slot is read once, the newest stamp comes from this same pass
            if back == 0 {
                latest_stamp = stamp;
            }
            earliest = idx;
            earliest_stamp = stamp;
            prev_age = age;
        }

        if latest_stamp == EMPTY || earliest == latest {
            return None;
        }

        Some(ValidSpan {
            earliest,
            latest,
            time_us: latest_stamp.wrapping_sub(earliest_stamp),
            steps: TriggerLog::<N>::distance(earliest, latest),
        })
    }
}

impl Default for FrequencyEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_VALID_WINDOW_US)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn record_at<const N: usize>(log: &TriggerLog<N>, clock: &ManualClock, stamps: &[u32]) {
        for &t in stamps {
            clock.set(t);
            log.record(clock.now_us());
        }
    }

    #[test]
    fn empty_log_is_zero() {
        let log = TriggerLog::<4>::new();
        let clock = ManualClock::new(5_000);
        let est = FrequencyEstimator::default();
        assert_eq!(est.estimate(&log, &clock), 0.0);
        assert!(est.valid_span(&log, &clock).is_none());
    }

    #[test]
    fn single_edge_is_zero() {
        let log = TriggerLog::<4>::new();
        let clock = ManualClock::new(0);
        record_at(&log, &clock, &[10_000]);
        assert_eq!(FrequencyEstimator::default().estimate(&log, &clock), 0.0);
    }

    #[test]
    fn evenly_spaced_edges_give_inverse_interval() {
        let log = TriggerLog::<10>::new();
        let clock = ManualClock::new(0);
        let stamps: [u32; 6] = core::array::from_fn(|i| 1_000 + i as u32 * 8_000);
        record_at(&log, &clock, &stamps);

        let hz = FrequencyEstimator::default().estimate(&log, &clock);
        assert!((hz - 125.0).abs() < 1e-3);
    }

    #[test]
    fn reference_scenario_four_slots() {
        let log = TriggerLog::<4>::new();
        let clock = ManualClock::new(0);
        let est = FrequencyEstimator::new(1_000_000);

        record_at(&log, &clock, &[0, 250_000, 500_000, 750_000]);
        assert!((est.estimate(&log, &clock) - 4.0).abs() < 1e-3);

        // Fifth edge replaces the slot holding t=0
        record_at(&log, &clock, &[1_000_000]);
        let span = est.valid_span(&log, &clock).unwrap();
        assert_eq!(log.slot(span.earliest), 250_000);
        assert_eq!(span.steps, 3);
        assert_eq!(span.time_us, 750_000);
        assert!((est.estimate(&log, &clock) - 4.0).abs() < 1e-5);
    }

    #[test]
    fn walk_stops_at_head_with_long_window() {
        // Three slots, window far longer than the history
        let log = TriggerLog::<3>::new();
        let clock = ManualClock::new(0);
        let est = FrequencyEstimator::new(u32::MAX / 2);

        // Old slow edges first, then three fast ones overwrite them all
        record_at(&log, &clock, &[1_000, 101_000, 201_000, 202_000, 203_000, 204_000]);
        let span = est.valid_span(&log, &clock).unwrap();

        assert_eq!(span.earliest, log.head());
        assert_eq!(span.steps, 2);
        assert_eq!(span.time_us, 2_000);
        assert!((est.estimate(&log, &clock) - 1_000.0).abs() < 1e-3);
    }

    #[test]
    fn overwritten_history_is_never_used() {
        let log = TriggerLog::<4>::new();
        let clock = ManualClock::new(0);
        let est = FrequencyEstimator::new(10_000_000);

        // Slow start at 10 Hz, then 8 edges at 1 kHz
        record_at(&log, &clock, &[100_000, 200_000, 300_000, 400_000]);
        let fast: [u32; 8] = core::array::from_fn(|i| 401_000 + i as u32 * 1_000);
        record_at(&log, &clock, &fast);

        assert!((est.estimate(&log, &clock) - 1_000.0).abs() < 1e-3);
    }

    #[test]
    fn stale_latest_edge_is_zero() {
        let log = TriggerLog::<8>::new();
        let clock = ManualClock::new(0);
        let est = FrequencyEstimator::new(100_000);

        record_at(&log, &clock, &[10_000, 20_000, 30_000]);
        assert!(est.estimate(&log, &clock) > 0.0);

        clock.set(30_000 + 100_001);
        assert_eq!(est.estimate(&log, &clock), 0.0);
        assert_eq!(log.total(), 3);
    }

    #[test]
    fn stale_tail_is_excluded() {
        let log = TriggerLog::<8>::new();
        let clock = ManualClock::new(0);
        let est = FrequencyEstimator::new(100_000);

        // First edge is far outside the window once the recent ones arrive
        record_at(&log, &clock, &[1_000, 500_000, 520_000, 540_000]);
        let span = est.valid_span(&log, &clock).unwrap();
        assert_eq!(span.steps, 2);
        assert!((est.estimate(&log, &clock) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn identical_stamps_are_zero() {
        let log = TriggerLog::<4>::new();
        let clock = ManualClock::new(0);
        record_at(&log, &clock, &[7_000, 7_000, 7_000]);
        assert_eq!(FrequencyEstimator::default().estimate(&log, &clock), 0.0);
    }

    #[test]
    fn survives_clock_wraparound() {
        let log = TriggerLog::<6>::new();
        let clock = ManualClock::new(0);
        let start = u32::MAX - 15_000;
        let stamps: [u32; 5] = core::array::from_fn(|i| start.wrapping_add(i as u32 * 10_000));
        record_at(&log, &clock, &stamps);

        let hz = FrequencyEstimator::default().estimate(&log, &clock);
        assert!((hz - 100.0).abs() < 1e-2);
    }

    /// Clock that fires an edge into the log whenever it is read, like an interrupt
    /// landing between the head snapshot and the clock sample.
    struct RacingClock<'a, const N: usize> {
        log: &'a TriggerLog<N>,
        edge_at: u32,
        now: u32,
    }

    impl<const N: usize> Clock for RacingClock<'_, N> {
        fn now_us(&self) -> u32 {
            self.log.record(self.edge_at);
            self.now
        }
    }

    #[test]
    fn edge_during_walk_does_not_corrupt_span() {
        let log = TriggerLog::<3>::new();
        let clock = ManualClock::new(0);
        record_at(&log, &clock, &[10_000, 20_000, 30_000]);

        // The racing edge rewrites slot 0, which the walk visits last
        let racing = RacingClock {
            log: &log,
            edge_at: 31_000,
            now: 31_000,
        };
        let span = FrequencyEstimator::default()
            .valid_span(&log, &racing)
            .unwrap();

        assert_eq!(span.latest, 2);
        assert_eq!(span.earliest, 1);
        assert_eq!(span.steps, 1);
        assert_eq!(span.time_us, 10_000);
        assert_eq!(log.total(), 4);
    }
}
