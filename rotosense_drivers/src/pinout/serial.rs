use super::PinDef;
use super::{PinMode, Port};

pub const USART2_TX: PinDef = PinDef {
    port: Port::A,
    pin: 2,
    mode: PinMode::Alt(7),
};

pub const USART2_RX: PinDef = PinDef {
    port: Port::A,
    pin: 3,
    mode: PinMode::Alt(7),
};
