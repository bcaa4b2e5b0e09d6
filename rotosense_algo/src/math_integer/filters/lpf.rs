// Integer exponential low-pass filter for noisy ADC channels.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

/// Fractional bits kept in the filter state so small steps still converge
const FRAC_BITS: u32 = 4;

pub struct FilterLPF {
    alpha: i32, // Weight of the previous output (0..255 = 0.0..1.0)
    state: i32, // Filtered value scaled by 2^FRAC_BITS
}

impl FilterLPF {
    /// Creates a filter already settled at `input_default`
    pub const fn new(input_default: u16, alpha: u8) -> FilterLPF {
        FilterLPF {
            alpha: alpha as i32,
            state: (input_default as i32) << FRAC_BITS,
        }
    }

    /// Math call: output = input + alpha * (previous - input) / 256
    pub fn tick(&mut self, input: u16) -> u16 {
        let target = (input as i32) << FRAC_BITS;

        // Max |diff| is 2^20, times 255 stays well inside i32
        let diff = self.state - target;

        // Division truncates toward zero so the state settles on the input from either side
        self.state = target + (diff * self.alpha) / 256;

        self.output()
    }

    /// Jumps straight to `value`, skipping the settling time
    pub fn preload(&mut self, value: u16) {
        self.state = (value as i32) << FRAC_BITS;
    }

    pub fn output(&self) -> u16 {
        (self.state >> FRAC_BITS) as u16
    }

    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_alpha_passes_input_through() {
        let mut lpf = FilterLPF::new(0, 0);
        assert_eq!(lpf.tick(1234), 1234);
        assert_eq!(lpf.tick(40_000), 40_000);
    }

    #[test]
    fn converges_to_step_input() {
        let mut lpf = FilterLPF::new(0, 200);
        let first = lpf.tick(10_000);
        assert!(first > 0 && first < 10_000);

        for _ in 0..200 {
            lpf.tick(10_000);
        }
        assert!((lpf.output() as i32 - 10_000).abs() <= 1);
    }

    #[test]
    fn full_scale_input_does_not_overflow() {
        let mut lpf = FilterLPF::new(0, 255);
        for _ in 0..5_000 {
            lpf.tick(u16::MAX);
        }
        assert!(lpf.output() >= u16::MAX - 1);

        lpf.set_alpha(0);
        assert_eq!(lpf.tick(0), 0);
    }

    #[test]
    fn preload_skips_settling() {
        let mut lpf = FilterLPF::new(0, 250);
        lpf.preload(3_000);
        assert_eq!(lpf.output(), 3_000);
        assert_eq!(lpf.tick(3_000), 3_000);
    }
}
