// Implements the HallSensor, joining the interrupt-side edge recorder with the
// polling-side kinematics queries (frequency, speed, distance).

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

pub mod frequency_estimator;
pub mod trigger_log;

use self::frequency_estimator::{FrequencyEstimator, DEFAULT_VALID_WINDOW_US};
use self::trigger_log::{TriggerLog, DEFAULT_CAPACITY};
use crate::clock::Clock;
use crate::edge_router::EdgeSink;

/// Inches in one foot, telemetry reports distance in feet
pub const INCHES_PER_FOOT: f32 = 12.0;

/// Geometry and estimation settings, fixed for the lifetime of the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    /// Maximum age of an edge used for frequency estimation [us]
    pub valid_window_us: u32,
    /// Distance travelled between two consecutive edges [inch]
    pub distance_per_trigger: f32,
    /// Edge frequency that corresponds to one unit of speed [Hz per mph], must be non-zero
    pub speed_divisor: f32,
}

impl SensorConfig {
    /// 3.35" wheel (10.52" circumference) with 9 magnets, speed reported in mph
    pub const DEFAULT: Self = Self {
        valid_window_us: DEFAULT_VALID_WINDOW_US,
        distance_per_trigger: 10.52 / 9.0,
        speed_divisor: 15.03,
    };

    pub const fn with_valid_window(mut self, valid_window_us: u32) -> Self {
        self.valid_window_us = valid_window_us;
        self
    }

    pub const fn with_distance_per_trigger(mut self, distance: f32) -> Self {
        self.distance_per_trigger = distance;
        self
    }

    pub const fn with_speed_divisor(mut self, divisor: f32) -> Self {
        self.speed_divisor = divisor;
        self
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// All derived quantities computed from one look at the log.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Kinematics {
    pub frequency_hz: f32,
    pub speed: f32,
    pub distance: f32,
    pub triggers: u32,
}

/// Hall-effect wheel sensor. Producer side is `on_edge`, every other method is read-only.
pub struct HallSensor<C, const N: usize = DEFAULT_CAPACITY> {
    clock: C,                        // Microsecond time source
    log: TriggerLog<N>,              // Edge timestamps shared with the interrupt
    estimator: FrequencyEstimator,   // Window-averaged rate estimation
    distance_per_trigger: f32,       // Geometry constant [inch]
    speed_divisor: f32,              // Frequency to speed conversion [Hz per mph]
}

/// Sensor with the default ten-slot log
pub type DefaultHallSensor<C> = HallSensor<C, DEFAULT_CAPACITY>;

impl<C: Clock, const N: usize> HallSensor<C, N> {
    /// Creates a sensor with an empty log. Usable in `static` initializers.
    pub const fn new(clock: C, config: SensorConfig) -> Self {
        Self {
            clock,
            log: TriggerLog::new(),
            estimator: FrequencyEstimator::new(config.valid_window_us),
            distance_per_trigger: config.distance_per_trigger,
            speed_divisor: config.speed_divisor,
        }
    }

    /// Records one edge at the current clock time. Interrupt context.
    #[inline(always)]
    pub fn record_edge(&self) {
        self.log.record(self.clock.now_us());
    }

    /// Edge rate over the validity window [Hz], 0.0 without enough fresh edges
    pub fn frequency(&self) -> f32 {
        self.estimator.estimate(&self.log, &self.clock)
    }

    /// Distance covered since boot [inch]
    pub fn distance(&self) -> f32 {
        self.distance_for(self.trigger_count())
    }

    /// Distance covered since boot [ft]
    pub fn distance_feet(&self) -> f32 {
        self.distance() / INCHES_PER_FOOT
    }

    /// Linear speed derived from the edge rate [mph]
    pub fn speed(&self) -> f32 {
        self.speed_for(self.frequency())
    }

    /// Edges seen since boot
    #[inline(always)]
    pub fn trigger_count(&self) -> u32 {
        self.log.total()
    }

    /// Frequency, speed and distance from one read of the log
    pub fn snapshot(&self) -> Kinematics {
        let triggers = self.trigger_count();
        let frequency_hz = self.frequency();
        Kinematics {
            frequency_hz,
            speed: self.speed_for(frequency_hz),
            distance: self.distance_for(triggers),
            triggers,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline(always)]
    fn distance_for(&self, triggers: u32) -> f32 {
        // f32 holds counts exactly only up to 2^24, multiply in f64 and round once
        (triggers as f64 * self.distance_per_trigger as f64) as f32
    }

    #[inline(always)]
    fn speed_for(&self, frequency_hz: f32) -> f32 {
        if frequency_hz == 0.0 {
            return 0.0;
        }
        frequency_hz / self.speed_divisor
    }
}

impl<C: Clock + Sync, const N: usize> EdgeSink for HallSensor<C, N> {
    #[inline(always)]
    fn on_edge(&self) {
        self.record_edge();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::edge_router::EdgeRouter;

    fn sensor<const N: usize>(config: SensorConfig) -> HallSensor<ManualClock, N> {
        HallSensor::new(ManualClock::new(0), config)
    }

    fn edges_every<const N: usize>(s: &HallSensor<ManualClock, N>, interval_us: u32, count: u32) {
        for _ in 0..count {
            s.clock().advance(interval_us);
            s.record_edge();
        }
    }

    #[test]
    fn fresh_sensor_reports_zero() {
        let s = sensor::<10>(SensorConfig::DEFAULT);
        assert_eq!(s.frequency(), 0.0);
        assert_eq!(s.speed(), 0.0);
        assert_eq!(s.distance(), 0.0);
        assert_eq!(s.trigger_count(), 0);
    }

    #[test]
    fn single_edge_gives_distance_but_no_speed() {
        let s = sensor::<10>(SensorConfig::DEFAULT);
        edges_every(&s, 1_000, 1);
        assert_eq!(s.trigger_count(), 1);
        assert_eq!(s.frequency(), 0.0);
        assert_eq!(s.speed(), 0.0);
        assert!((s.distance() - 10.52 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn steady_rotation_speed_and_frequency() {
        let s = sensor::<10>(SensorConfig::DEFAULT);
        edges_every(&s, 10_000, 12); // 100 Hz

        assert!((s.frequency() - 100.0).abs() < 1e-3);
        assert!((s.speed() - 100.0 / 15.03).abs() < 1e-4);
    }

    #[test]
    fn distance_grows_by_one_step_per_edge() {
        let step = 2.5;
        let s = sensor::<4>(SensorConfig::DEFAULT.with_distance_per_trigger(step));

        let mut prev = s.distance();
        for n in 1..=20u32 {
            edges_every(&s, 3_000, 1);
            let d = s.distance();
            assert!(d >= prev);
            assert!((d - prev - step).abs() < 1e-3);
            assert!((d - n as f32 * step).abs() < 1e-5);
            prev = d;
        }
        assert_eq!(s.trigger_count(), 20);
    }

    #[test]
    fn distance_stays_exact_past_f32_integer_range() {
        // 2^24 + 1 edges is 97 * 172_961, the product is a whole number
        let s = sensor::<4>(SensorConfig::DEFAULT.with_distance_per_trigger(1.0 / 97.0));
        assert_eq!(s.distance_for(16_777_217), 172_961.0);
    }

    #[test]
    fn staleness_zeroes_speed_but_keeps_distance() {
        let s = sensor::<10>(SensorConfig::DEFAULT.with_valid_window(50_000));
        edges_every(&s, 5_000, 6);
        let distance = s.distance();
        assert!(s.speed() > 0.0);

        s.clock().advance(50_001);
        assert_eq!(s.frequency(), 0.0);
        assert_eq!(s.speed(), 0.0);
        assert_eq!(s.trigger_count(), 6);
        assert_eq!(s.distance(), distance);
    }

    #[test]
    fn distance_in_feet() {
        let s = sensor::<10>(SensorConfig::DEFAULT.with_distance_per_trigger(1.0));
        edges_every(&s, 1_000, 24);
        assert!((s.distance_feet() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn snapshot_matches_individual_queries() {
        let s = sensor::<8>(SensorConfig::DEFAULT);
        edges_every(&s, 20_000, 5);

        let snap = s.snapshot();
        assert_eq!(snap.triggers, 5);
        assert_eq!(snap.frequency_hz, s.frequency());
        assert_eq!(snap.speed, s.speed());
        assert_eq!(snap.distance, s.distance());
    }

    #[test]
    fn routed_interrupt_records_edges() {
        static CLOCK: ManualClock = ManualClock::new(0);
        static SENSOR: HallSensor<&ManualClock, 4> = HallSensor::new(&CLOCK, SensorConfig::DEFAULT);
        static ROUTER: EdgeRouter<1> = EdgeRouter::new();

        ROUTER.bind(0, &SENSOR).unwrap();
        for _ in 0..6 {
            CLOCK.advance(25_000);
            ROUTER.dispatch(0);
        }

        assert_eq!(SENSOR.trigger_count(), 6);
        assert!((SENSOR.frequency() - 40.0).abs() < 1e-4);
    }

    #[test]
    fn concurrent_producer_never_yields_garbage() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;
        use std::thread;

        let sensor: Arc<HallSensor<ManualClock, 6>> = Arc::new(HallSensor::new(
            ManualClock::new(1),
            SensorConfig::DEFAULT.with_valid_window(u32::MAX / 2),
        ));
        let done = Arc::new(AtomicBool::new(false));

        let producer = {
            let sensor = Arc::clone(&sensor);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                for _ in 0..20_000 {
                    sensor.clock().advance(500);
                    sensor.on_edge();
                }
                done.store(true, Ordering::Release);
            })
        };

        while !done.load(Ordering::Acquire) {
            let hz = sensor.frequency();
            assert!(hz.is_finite());
            assert!(hz >= 0.0);
            // Edges are 500 us apart, any torn span would land far outside this bound
            assert!(hz <= 2_000.0 * 1.001, "frequency {hz} above edge rate");
        }
        producer.join().unwrap();

        assert_eq!(sensor.trigger_count(), 20_000);
        assert!((sensor.frequency() - 2_000.0).abs() < 1e-2);
    }
}
