use hal::gpio::{self, Edge, Pin, Pull};

use crate::pinout::hall::HALL_OUT;

/// EXTI line the hall sensor fires on
pub const HALL_LINE: u8 = HALL_OUT.line();

/// Configures the hall input with pull-up and a rising-edge interrupt
pub fn init_hall_input() -> Pin {
    let mut pin = HALL_OUT.init();
    pin.pull(Pull::Up);
    pin.enable_interrupt(Edge::Rising);
    pin
}

/// Acknowledges the pending EXTI request, call first thing in the handler
#[inline(always)]
pub fn clear_hall_interrupt() {
    gpio::clear_exti_interrupt(HALL_LINE);
}
