// Implements the ServoMapper, converting logical pitch/yaw camera angles into pulse
// widths for two multi-turn hobby servos driving a geared gimbal.

// Key Features:
// - Rejects out-of-range requests instead of saturating them; nothing is actuated.
// - Compensates the mechanical coupling of the pitch axis to yaw rotation.
// - Scales servo shaft angles through the gear ratios of each axis.
// - Maps shaft angles linearly onto the servo pulse range with integer math.

// Detailed Operation:
// The yaw window is half of the servo travel divided by the yaw gear ratio, the pitch
// window is a half turn up or down. A request outside either window returns an error and
// leaves the last commanded pulses untouched, so the caller simply retries on its next
// control cycle. Accepted angles are multiplied by their gear ratios (truncated to whole
// degrees), the pitch shaft angle is corrected by the yaw angle because rotating the yaw
// stage drags the pitch gear along, and both are mapped from the centred servo travel
// onto the pulse range.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use crate::error::MapError;

/// Gear train and servo characteristics of the gimbal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MapperConfig {
    /// Servo shaft turns per yaw output turn
    pub yaw_gear_ratio: f32,
    /// Servo shaft turns per pitch output turn
    pub pitch_gear_ratio: f32,
    /// Pitch allowed up or down from level [deg]
    pub pitch_limit_deg: f32,
    /// Full servo travel [deg]
    pub servo_range_deg: i32,
    /// Pulse width at the negative end of travel [us]
    pub min_pulse_us: i32,
    /// Pulse width at the positive end of travel [us]
    pub max_pulse_us: i32,
}

impl MapperConfig {
    /// 5-turn servos, 50:15 yaw and 40:20 pitch gearing, 500..2500 us pulses
    pub const DEFAULT: Self = Self {
        yaw_gear_ratio: 50.0 / 15.0,
        pitch_gear_ratio: 40.0 / 20.0,
        pitch_limit_deg: 90.0,
        servo_range_deg: 360 * 5,
        min_pulse_us: 500,
        max_pulse_us: 2500,
    };

    /// Largest yaw reachable in either direction [deg]
    pub fn yaw_limit_deg(&self) -> f32 {
        (self.servo_range_deg as f32 / self.yaw_gear_ratio) / 2.0
    }

    /// Pulse width for the centred servo
    pub const fn center_pulse_us(&self) -> u16 {
        ((self.min_pulse_us + self.max_pulse_us) / 2) as u16
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Pulse widths for both servos [us]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoPulses {
    pub pitch_us: u16,
    pub yaw_us: u16,
}

pub struct ServoMapper {
    config: MapperConfig,
    yaw_limit: f32,      // Cached yaw window [deg]
    pulses: ServoPulses, // Last accepted command
}

impl ServoMapper {
    pub fn new(config: MapperConfig) -> Self {
        let center = config.center_pulse_us();
        Self {
            yaw_limit: config.yaw_limit_deg(),
            config,
            pulses: ServoPulses {
                pitch_us: center,
                yaw_us: center,
            },
        }
    }

    /// Maps a pitch/yaw request. On rejection the last command stays in effect.
    pub fn tick(&mut self, pitch_deg: f32, yaw_deg: f32) -> Result<ServoPulses, MapError> {
        let pulses = self.map(pitch_deg, yaw_deg)?;
        self.pulses = pulses;
        Ok(pulses)
    }

    /// Pure conversion, no state change
    pub fn map(&self, pitch_deg: f32, yaw_deg: f32) -> Result<ServoPulses, MapError> {
        // Written as "not inside" so NaN is rejected too
        if !(yaw_deg >= -self.yaw_limit && yaw_deg <= self.yaw_limit) {
            #[cfg(feature = "defmt")]
            defmt::warn!("GIMBAL: yaw limit reached ({} deg)", yaw_deg);
            return Err(MapError::YawOutOfRange {
                requested: yaw_deg,
                limit: self.yaw_limit,
            });
        }

        let pitch_limit = self.config.pitch_limit_deg;
        if !(pitch_deg >= -pitch_limit && pitch_deg <= pitch_limit) {
            #[cfg(feature = "defmt")]
            defmt::warn!("GIMBAL: pitch limit reached ({} deg)", pitch_deg);
            return Err(MapError::PitchOutOfRange {
                requested: pitch_deg,
                limit: pitch_limit,
            });
        }

        // Servo shaft angles, truncated to whole degrees
        let yaw_servo = (yaw_deg * self.config.yaw_gear_ratio) as i32;
        let pitch_servo = (pitch_deg * self.config.pitch_gear_ratio) as i32;

        // Turning the yaw stage rotates the pitch gear with it
        let pitch_servo = pitch_servo - yaw_deg as i32;

        Ok(ServoPulses {
            pitch_us: self.angle_to_pulse(pitch_servo),
            yaw_us: self.angle_to_pulse(yaw_servo),
        })
    }

    /// Last accepted command (centred until the first accepted request)
    pub fn pulses(&self) -> ServoPulses {
        self.pulses
    }

    pub fn yaw_limit_deg(&self) -> f32 {
        self.yaw_limit
    }

    /// Linear map of a centred shaft angle onto the pulse range
    fn angle_to_pulse(&self, servo_deg: i32) -> u16 {
        let half = self.config.servo_range_deg / 2;
        let (out_min, out_max) = (self.config.min_pulse_us, self.config.max_pulse_us);
        let pulse = (servo_deg + half) * (out_max - out_min) / (2 * half) + out_min;
        pulse.clamp(0, u16::MAX as i32) as u16
    }
}

impl Default for ServoMapper {
    fn default() -> Self {
        Self::new(MapperConfig::DEFAULT)
    }
}
