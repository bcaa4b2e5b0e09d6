//! Battery sense dividers on ADC1.
use super::PinDef;
use super::{PinMode, Port};

/// Control pack divider, ADC1_IN2
pub const CONTROL_SENSE: PinDef = PinDef {
    port: Port::A,
    pin: 1,
    mode: PinMode::Analog,
};

/// Drive pack divider, ADC1_IN12
pub const DRIVE_SENSE: PinDef = PinDef {
    port: Port::B,
    pin: 1,
    mode: PinMode::Analog,
};

pub const CONTROL_CHANNEL: u8 = 2;
pub const DRIVE_CHANNEL: u8 = 12;
