// Error types for configuration misuse, rejected actuation and serial link frames.
// Insufficient sensor data is never an error: the estimator reports zero instead.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use thiserror::Error;

/// Attaching an edge sink to an interrupt line failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BindError {
    /// The router has no slot for this line.
    #[error("edge line {line} out of range (router has {lines} lines)")]
    LineOutOfRange { line: u8, lines: usize },

    /// Another sink is already attached to this line.
    #[error("edge line {line} already has a handler")]
    AlreadyBound { line: u8 },
}

/// Requested gimbal angle is outside the mechanical window, nothing was actuated.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MapError {
    #[error("yaw {requested} outside +/-{limit} degrees")]
    YawOutOfRange { requested: f32, limit: f32 },

    #[error("pitch {requested} outside +/-{limit} degrees")]
    PitchOutOfRange { requested: f32, limit: f32 },
}

/// A control frame was received but rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// XOR checksum did not match the payload.
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },

    /// One of the float fields is NaN or infinite.
    #[error("frame carries a non-finite value")]
    NonFinite,
}
