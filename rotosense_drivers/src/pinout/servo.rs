//! Gimbal servo outputs on TIM3.
use super::PinDef;
use super::{PinMode, Port};

/// Yaw servo signal, TIM3_CH1
pub const YAW: PinDef = PinDef {
    port: Port::A,
    pin: 6,
    mode: PinMode::Alt(2),
};

/// Pitch servo signal, TIM3_CH2
pub const PITCH: PinDef = PinDef {
    port: Port::A,
    pin: 4,
    mode: PinMode::Alt(2),
};
