use hal::gpio::{Pin, PinMode, Port};

pub mod battery;
pub mod hall;
pub mod serial;
pub mod servo;

/// Represents the definition of a GPIO pin.
pub struct PinDef {
    /// The port to which the pin belongs (e.g., Port::A, Port::B).
    port: Port,
    /// The pin number within the port.
    pin: u8,
    /// The mode of the pin (e.g., Input, Analog, Alternate function).
    mode: PinMode,
}

impl PinDef {
    /// Pin number, which is also its EXTI line
    pub const fn line(&self) -> u8 {
        self.pin
    }

    /// Converts the PinDef struct to a Pin struct. Useful for predefined pin configurations.
    /// # Example
    /// ```ignore
    /// let mut tx = pinout::serial::USART2_TX.init();
    /// ```
    pub fn init(&self) -> Pin {
        Pin::new(self.port, self.pin, self.mode)
    }
}
