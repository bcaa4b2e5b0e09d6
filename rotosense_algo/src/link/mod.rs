pub mod control_packet;
pub mod telemetry;

pub use control_packet::{ControlCommand, PacketDecoder};
pub use telemetry::{Telemetry, TelemetryLine};
