//! Hall-effect sensor input. One rising edge per magnet passing the sensor.
use super::PinDef;
use super::{PinMode, Port};

/// Open-collector hall output, pulled up, routed to EXTI line 0
pub const HALL_OUT: PinDef = PinDef {
    port: Port::B,
    pin: 0,
    mode: PinMode::Input,
};
