#![cfg_attr(not(test), no_std)]

pub mod analog;
pub mod clock;
pub mod edge_router;
pub mod error;
pub mod gimbal;
pub mod hall_sensor;
pub mod link;
pub mod math_integer;

use analog::battery::{BatteryGauge, GaugeConfig};
use gimbal::{MapperConfig, ServoMapper, ServoPulses};
use hall_sensor::Kinematics;
use link::{ControlCommand, Telemetry};

pub use clock::Clock;
pub use edge_router::{EdgeRouter, EdgeSink};
pub use error::{BindError, LinkError, MapError};
pub use hall_sensor::{DefaultHallSensor, HallSensor, SensorConfig};

/// Control-loop side of the rover: gimbal commands in, telemetry out.
/// The hall sensor itself lives in a `static` so the edge interrupt can reach it.
pub struct RoverController {
    mapper: ServoMapper, // Pitch/yaw to servo pulses

    control_battery: BatteryGauge, // Logic and servo pack
    drive_battery: BatteryGauge,   // Drive motor pack

    last_seq: Option<u8>, // Sequence of the last applied command
    rejected: u32,        // Commands refused by the mapper
}

impl RoverController {
    /// Create a new RoverController instance.
    ///
    /// # Arguments
    /// * `mapper` - Gimbal gearing and servo pulse range
    /// * `control_battery` - Gauge settings for the control pack
    /// * `drive_battery` - Gauge settings for the drive pack
    pub fn new(mapper: MapperConfig, control_battery: GaugeConfig, drive_battery: GaugeConfig) -> Self {
        Self {
            mapper: ServoMapper::new(mapper),
            control_battery: BatteryGauge::new(control_battery),
            drive_battery: BatteryGauge::new(drive_battery),
            last_seq: None,
            rejected: 0,
        }
    }

    /// Applies one control frame to the gimbal.
    ///
    /// Returns the pulses to write, or None when the request was rejected and the
    /// servos must keep their previous position.
    pub fn apply(&mut self, cmd: &ControlCommand) -> Option<ServoPulses> {
        self.last_seq = Some(cmd.seq);
        // Drive channel is owned by the motor ESC, it is only traced here
        #[cfg(feature = "defmt")]
        defmt::trace!(
            "ROVER: seq {} throttle {} steering {}",
            cmd.seq,
            cmd.throttle,
            cmd.steering
        );
        match self.mapper.tick(cmd.pitch, cmd.yaw) {
            Ok(pulses) => Some(pulses),
            Err(_err) => {
                self.rejected = self.rejected.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!("ROVER: seq {} not actuated: {}", cmd.seq, _err);
                None
            }
        }
    }

    /// Feeds the latest battery ADC readings
    pub fn tick_batteries(&mut self, control_adc: u16, drive_adc: u16) {
        self.control_battery.tick(control_adc);
        self.drive_battery.tick(drive_adc);
    }

    /// Telemetry frame for the given sensor snapshot
    pub fn telemetry(&self, kinematics: &Kinematics) -> Telemetry {
        Telemetry::new(
            kinematics,
            self.control_battery.percent(),
            self.drive_battery.percent(),
        )
    }

    /// Servo pulses currently commanded
    #[inline(always)]
    pub fn pulses(&self) -> ServoPulses {
        self.mapper.pulses()
    }

    pub fn last_seq(&self) -> Option<u8> {
        self.last_seq
    }

    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    pub fn control_battery(&self) -> &BatteryGauge {
        &self.control_battery
    }

    pub fn drive_battery(&self) -> &BatteryGauge {
        &self.drive_battery
    }
}
