#![no_std]

pub mod hall_input;
pub mod micros;
pub mod pinout;
pub mod serial_link;
pub mod servo_pwm;
pub mod tick_timer;
