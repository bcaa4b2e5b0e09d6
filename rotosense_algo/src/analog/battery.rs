// Implements the BatteryGauge module, turning raw battery ADC readings into a filtered
// voltage and a state-of-charge percentage for telemetry.

// Key Features:
// - Processes raw battery voltage readings from ADC
// - Applies a low-pass filter to smooth load transients
// - Scales filtered output to millivolts through the divider-corrected full scale
// - Maps voltage linearly between empty and full pack voltages
// - Flags and logs the transition into the low-battery zone once

// Detailed Operation:
// Every tick pushes one ADC code through FilterLPF. The filtered code is scaled to
// millivolts with `adc_to_value` and placed on the empty..full span of the pack, giving
// a clamped 0..100 % value. The gauge starts from the first reading instead of zero so
// telemetry does not report an empty pack right after boot.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use crate::math_integer::filters::lpf::FilterLPF;
use crate::math_integer::normalization::{adc_to_value, value_to_percent};

/// Pack and measurement-chain description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GaugeConfig {
    /// Voltage at ADC full scale, divider included [mV]
    pub full_scale_mv: i32,
    /// Pack voltage reported as 0 % [mV]
    pub empty_mv: i32,
    /// Pack voltage reported as 100 % [mV]
    pub full_mv: i32,
    /// Percentage at or below which the pack counts as low
    pub low_pct: u8,
    /// Filter coefficient (0..255 = no filtering..heavy filtering)
    pub filter_alpha: u8,
}

impl GaugeConfig {
    /// Lithium-polymer pack with `cells` cells in series (3.3 V empty, 4.2 V full per cell)
    pub const fn lipo(cells: i32, full_scale_mv: i32) -> Self {
        Self {
            full_scale_mv,
            empty_mv: 3_300 * cells,
            full_mv: 4_200 * cells,
            low_pct: 15,
            filter_alpha: 240,
        }
    }

    pub const fn with_low_pct(mut self, low_pct: u8) -> Self {
        self.low_pct = low_pct;
        self
    }

    pub const fn with_filter_alpha(mut self, alpha: u8) -> Self {
        self.filter_alpha = alpha;
        self
    }
}

pub struct BatteryGauge {
    config: GaugeConfig,
    filter: FilterLPF, // Smooths the raw ADC code
    started: bool,     // First reading preloads the filter
    voltage_mv: i32,   // Filtered pack voltage
    percent: u8,       // State of charge estimate
    low: bool,         // Latched low-battery flag
}

impl BatteryGauge {
    pub const fn new(config: GaugeConfig) -> Self {
        Self {
            filter: FilterLPF::new(0, config.filter_alpha),
            config,
            started: false,
            voltage_mv: 0,
            percent: 0,
            low: false,
        }
    }

    /// Updates the gauge with one ADC reading.
    ///
    /// A zero code before the first real sample means the conversion has not run yet,
    /// it is ignored instead of seeding the filter with an empty pack.
    pub fn tick(&mut self, adc: u16) -> &Self {
        if !self.started {
            if adc == 0 {
                return self;
            }
            self.filter.preload(adc);
            self.started = true;
        }
        let filtered = self.filter.tick(adc);

        self.voltage_mv = adc_to_value(filtered, self.config.full_scale_mv);
        self.percent = value_to_percent(self.voltage_mv, self.config.empty_mv, self.config.full_mv);

        let low = self.percent <= self.config.low_pct;
        if low && !self.low {
            #[cfg(feature = "defmt")]
            defmt::warn!("BATTERY: low, {}mV ({}%)", self.voltage_mv, self.percent);
        }
        self.low = low;
        self
    }

    /// Filtered pack voltage in millivolts
    pub fn voltage_mv(&self) -> i32 {
        self.voltage_mv
    }

    /// State of charge, 0..=100
    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn is_low(&self) -> bool {
        self.low
    }

    /// True once a real sample has been taken
    pub fn is_started(&self) -> bool {
        self.started
    }
}
