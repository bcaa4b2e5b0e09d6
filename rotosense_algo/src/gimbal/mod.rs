pub mod servo_mapper;

pub use servo_mapper::{MapperConfig, ServoMapper, ServoPulses};
