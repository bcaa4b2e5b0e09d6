// Telemetry line sent back to the companion computer:
// "tel: <speed_mph> <distance_ft> <control_battery_pct> <drive_battery_pct>\n"

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use core::fmt::{self, Write};

use heapless::String;

use crate::hall_sensor::{Kinematics, INCHES_PER_FOOT};

/// Room for two large fixed-point values and both percentages
pub const LINE_CAPACITY: usize = 64;

pub type TelemetryLine = String<LINE_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    pub speed_mph: f32,
    pub distance_ft: f32,
    pub control_battery_pct: u8,
    pub drive_battery_pct: u8,
}

impl Telemetry {
    pub fn new(kinematics: &Kinematics, control_battery_pct: u8, drive_battery_pct: u8) -> Self {
        Self {
            speed_mph: kinematics.speed,
            distance_ft: kinematics.distance / INCHES_PER_FOOT,
            control_battery_pct,
            drive_battery_pct,
        }
    }

    /// Renders the line, fails only if the values do not fit LINE_CAPACITY
    pub fn format(&self) -> Result<TelemetryLine, fmt::Error> {
        let mut line = TelemetryLine::new();
        writeln!(
            line,
            "tel: {:.2} {:.2} {} {}",
            self.speed_mph, self.distance_ft, self.control_battery_pct, self.drive_battery_pct
        )?;
        Ok(line)
    }
}
