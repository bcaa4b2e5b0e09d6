// Implements the PacketDecoder, a byte-at-a-time parser for control frames arriving
// from the companion computer over the serial link.

// Key Features:
// - Works one byte at a time, suitable for the UART receive interrupt.
// - Hunts for the frame header and resynchronises after any rejected frame.
// - Verifies the XOR checksum and rejects NaN or infinite values.
// - Tracks sequence gaps to count frames lost on the wire.

// Frame layout (22 bytes, little-endian):
// | 0..4 header 0xDEADBEEF | 4 seq u8 | 5..9 pitch f32 | 9..13 yaw f32 |
// | 13..17 throttle f32 | 17..21 steering f32 | 21 XOR of bytes 0..21 |

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use crate::error::LinkError;

/// Frame start marker
pub const HEADER: u32 = 0xDEAD_BEEF;

/// Total frame length including header and checksum
pub const FRAME_LEN: usize = 22;

const HEADER_BYTES: [u8; 4] = HEADER.to_le_bytes();
const CHECKSUM_IDX: usize = FRAME_LEN - 1;

/// One decoded control frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlCommand {
    pub seq: u8,
    pub pitch: f32,
    pub yaw: f32,
    /// Drive channel, validated but not actuated by this firmware
    pub throttle: f32,
    /// Drive channel, validated but not actuated by this firmware
    pub steering: f32,
}

impl ControlCommand {
    /// Serializes the command into a complete frame (the sender side of the link)
    pub fn to_frame(&self) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        frame[0..4].copy_from_slice(&HEADER_BYTES);
        frame[4] = self.seq;
        frame[5..9].copy_from_slice(&self.pitch.to_le_bytes());
        frame[9..13].copy_from_slice(&self.yaw.to_le_bytes());
        frame[13..17].copy_from_slice(&self.throttle.to_le_bytes());
        frame[17..21].copy_from_slice(&self.steering.to_le_bytes());
        frame[CHECKSUM_IDX] = checksum(&frame[..CHECKSUM_IDX]);
        frame
    }
}

/// XOR of all bytes
#[inline(always)]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

pub struct PacketDecoder {
    buf: [u8; FRAME_LEN], // Frame under assembly
    len: usize,           // Bytes collected so far
    last_seq: Option<u8>, // Sequence of the last accepted frame
    dropped: u32,         // Frames missing from the sequence
    rejected: u32,        // Frames failing validation
}

impl PacketDecoder {
    pub const fn new() -> Self {
        Self {
            buf: [0; FRAME_LEN],
            len: 0,
            last_seq: None,
            dropped: 0,
            rejected: 0,
        }
    }

    /// Feeds one received byte. Returns a result once a complete frame has been seen.
    pub fn push(&mut self, byte: u8) -> Option<Result<ControlCommand, LinkError>> {
        // Header hunt, header bytes are all distinct so a mismatch can only restart on byte 0
        if self.len < HEADER_BYTES.len() {
            if byte == HEADER_BYTES[self.len] {
                self.buf[self.len] = byte;
                self.len += 1;
            } else if byte == HEADER_BYTES[0] {
                self.buf[0] = byte;
                self.len = 1;
            } else {
                self.len = 0;
            }
            return None;
        }

        self.buf[self.len] = byte;
        self.len += 1;
        if self.len < FRAME_LEN {
            return None;
        }

        self.len = 0; // Next byte starts a new header hunt
        let result = self.decode();
        if result.is_err() {
            self.rejected = self.rejected.wrapping_add(1);
        }
        Some(result)
    }

    /// Frames lost according to sequence numbers
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Frames discarded for checksum or value errors
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    fn decode(&mut self) -> Result<ControlCommand, LinkError> {
        let expected = checksum(&self.buf[..CHECKSUM_IDX]);
        let actual = self.buf[CHECKSUM_IDX];
        if expected != actual {
            #[cfg(feature = "defmt")]
            defmt::warn!("LINK: checksum mismatch {=u8:#x} != {=u8:#x}", actual, expected);
            return Err(LinkError::Checksum { expected, actual });
        }

        let cmd = ControlCommand {
            seq: self.buf[4],
            pitch: self.f32_at(5),
            yaw: self.f32_at(9),
            throttle: self.f32_at(13),
            steering: self.f32_at(17),
        };

        let finite = cmd.pitch.is_finite()
            && cmd.yaw.is_finite()
            && cmd.throttle.is_finite()
            && cmd.steering.is_finite();
        if !finite {
            #[cfg(feature = "defmt")]
            defmt::warn!("LINK: seq {} carries non-finite values", cmd.seq);
            return Err(LinkError::NonFinite);
        }

        if let Some(prev) = self.last_seq {
            // Sender counts modulo 256
            let gap = cmd.seq.wrapping_sub(prev).wrapping_sub(1);
            self.dropped = self.dropped.wrapping_add(gap as u32);
        }
        self.last_seq = Some(cmd.seq);

        #[cfg(feature = "defmt")]
        defmt::trace!("LINK: {}", cmd);
        Ok(cmd)
    }

    #[inline(always)]
    fn f32_at(&self, offset: usize) -> f32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.buf[offset..offset + 4]);
        f32::from_le_bytes(raw)
    }
}

impl Default for PacketDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(seq: u8) -> ControlCommand {
        ControlCommand {
            seq,
            pitch: 12.5,
            yaw: -200.0,
            throttle: 0.25,
            steering: -0.5,
        }
    }

    fn feed(decoder: &mut PacketDecoder, bytes: &[u8]) -> Option<Result<ControlCommand, LinkError>> {
        let mut last = None;
        for &b in bytes {
            if let Some(result) = decoder.push(b) {
                last = Some(result);
            }
        }
        last
    }

    #[test]
    fn frame_layout_matches_sender() {
        let frame = command(7).to_frame();
        assert_eq!(&frame[..4], &[0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(frame[4], 7);
        assert_eq!(&frame[5..9], &12.5f32.to_le_bytes());
        assert_eq!(checksum(&frame), 0); // XOR over a valid frame cancels out
    }

    #[test]
    fn decodes_frame_fed_byte_by_byte() {
        let mut decoder = PacketDecoder::new();
        let frame = command(1).to_frame();

        for &b in &frame[..FRAME_LEN - 1] {
            assert!(decoder.push(b).is_none());
        }
        let cmd = decoder.push(frame[FRAME_LEN - 1]).unwrap().unwrap();
        assert_eq!(cmd, command(1));
    }

    #[test]
    fn skips_noise_before_header() {
        let mut decoder = PacketDecoder::new();
        // Noise includes a partial header that must not confuse the hunt
        let noise = [0x00, 0xEF, 0xBE, 0x11, 0xEF, 0xEF];
        assert!(feed(&mut decoder, &noise).is_none());

        let cmd = feed(&mut decoder, &command(3).to_frame()).unwrap().unwrap();
        assert_eq!(cmd.seq, 3);
    }

    #[test]
    fn bad_checksum_is_rejected_then_resyncs() {
        let mut decoder = PacketDecoder::new();
        let mut frame = command(9).to_frame();
        frame[10] ^= 0x40;

        match feed(&mut decoder, &frame) {
            Some(Err(LinkError::Checksum { .. })) => {}
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(decoder.rejected(), 1);

        let cmd = feed(&mut decoder, &command(10).to_frame()).unwrap().unwrap();
        assert_eq!(cmd.seq, 10);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut decoder = PacketDecoder::new();
        let mut cmd = command(0);
        cmd.yaw = f32::NAN;
        assert_eq!(
            feed(&mut decoder, &cmd.to_frame()),
            Some(Err(LinkError::NonFinite))
        );
    }

    #[test]
    fn counts_sequence_gaps_across_wrap() {
        let mut decoder = PacketDecoder::new();
        for seq in [250u8, 251, 254, 255, 0, 3] {
            feed(&mut decoder, &command(seq).to_frame()).unwrap().unwrap();
        }
        // Missing: 252, 253, 1, 2
        assert_eq!(decoder.dropped(), 4);
    }
}
