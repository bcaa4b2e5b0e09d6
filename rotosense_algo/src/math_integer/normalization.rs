// Integer conversions from raw ADC codes to physical units.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

/// Converts a left-aligned ADC reading to millivolts, milliamps, etc.
///
/// # Arguments
/// * `adc` - Raw reading, 0..=65535 spans the whole input range [u16]
/// * `full_scale` - Physical value at full ADC scale, divider ratio included [i32]
///
/// # Returns
/// The value in millivolts, milliamps, etc. [i32]
pub const fn adc_to_value(adc: u16, full_scale: i32) -> i32 {
    // Widen to keep the full 16 x 31 bit product
    ((adc as i64 * full_scale as i64) >> 16) as i32
}

/// Places `value` on the `empty..full` span as a 0..=100 percentage.
///
/// Values beyond either end are clamped. A degenerate span reports 0.
pub const fn value_to_percent(value: i32, empty: i32, full: i32) -> u8 {
    let span = full - empty;
    if span <= 0 {
        return 0;
    }
    let above = value - empty;
    if above <= 0 {
        0
    } else if above >= span {
        100
    } else {
        (above as i64 * 100 / span as i64) as u8
    }
}
