//! Fixed-cadence frames: a `0xFA` start byte, an angle index, the rotation
//! speed, then a fixed number of readings on consecutive degrees.

use crate::constants::{
    FIXED_INDEX_OFFSET, FIXED_START_BYTE, HLS_BODY_SIZE, HLS_READINGS, XV11_BODY_SIZE,
    XV11_READINGS,
};
use crate::decoder::{admit_frame, ChecksumPolicy, DecoderStats, PacketDecoder};
use crate::error::LidarError;
use crate::numeric::{to_u16, to_u32, wrap_degree};
use crate::serial::{read, read_until};
use spinlidar_data::{FixedCadenceFormat, Measurement};
use std::collections::VecDeque;
use std::io::Read;

const INVALID_FLAG: u32 = 0x8000;
const LOW_CONFIDENCE_FLAG: u32 = 0x4000;
const DISTANCE_MASK: u32 = 0x3FFF;

/// One decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedCadenceFrame {
    pub rotation_speed: f32,
    pub measurements: Vec<Measurement>,
}

pub fn body_size(format: FixedCadenceFormat) -> usize {
    match format {
        FixedCadenceFormat::Xv11 => XV11_BODY_SIZE,
        FixedCadenceFormat::Hls => HLS_BODY_SIZE,
    }
}

fn base_angle(index: u8, step: i32) -> i32 {
    (index as i32 - FIXED_INDEX_OFFSET) * step
}

/// Unpacks an XV-11 measurement word. Bits 0-13 are the distance, bit 14
/// the low-confidence flag, bit 15 the invalid flag and the high half the
/// signal strength.
pub fn decode_measurement_word(angle: u16, word: u32) -> Measurement {
    Measurement {
        angle,
        distance: (word & DISTANCE_MASK) as u16,
        strength: Some((word >> 16) as u16),
        invalid: word & INVALID_FLAG != 0,
        low_confidence: word & LOW_CONFIDENCE_FLAG != 0,
    }
}

/// Inverse of [`decode_measurement_word`]. Distances above 14 bits are
/// truncated.
pub fn encode_measurement_word(
    distance: u16,
    strength: u16,
    invalid: bool,
    low_confidence: bool,
) -> u32 {
    let mut word = ((strength as u32) << 16) | (distance as u32 & DISTANCE_MASK);
    if invalid {
        word |= INVALID_FLAG;
    }
    if low_confidence {
        word |= LOW_CONFIDENCE_FLAG;
    }
    word
}

/// Folded checksum over the first 20 bytes of an XV-11 frame, start byte
/// included.
pub(crate) fn xv11_checksum(frame: &[u8]) -> u16 {
    let chk32 = frame
        .chunks_exact(2)
        .take(10)
        .fold(0u32, |acc, w| (acc << 1) + to_u16(w[1], w[0]) as u32);
    (((chk32 & 0x7FFF) + (chk32 >> 15)) & 0x7FFF) as u16
}

/// Complement of the byte sum over the first 40 bytes of an HLS frame.
pub(crate) fn hls_checksum(frame: &[u8]) -> u8 {
    !frame
        .iter()
        .take(40)
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Decodes the body following the start byte. Returns the frame together
/// with the transmitted and the computed checksum, or `None` when `body` is
/// shorter than [`body_size`].
pub fn parse_body(
    format: FixedCadenceFormat,
    body: &[u8],
) -> Option<(FixedCadenceFrame, u16, u16)> {
    if body.len() < body_size(format) {
        return None;
    }
    let mut frame = vec![FIXED_START_BYTE];
    frame.extend_from_slice(body);

    match format {
        FixedCadenceFormat::Xv11 => {
            let base = base_angle(body[0], XV11_READINGS as i32);
            let measurements = (0..XV11_READINGS)
                .map(|i| {
                    let word = to_u32(&body[3 + 4 * i..]);
                    decode_measurement_word(wrap_degree(base + i as i32), word)
                })
                .collect();
            let decoded = FixedCadenceFrame {
                rotation_speed: (to_u16(body[2], body[1]) as f32) / 64.,
                measurements,
            };
            let expected = to_u16(body[20], body[19]);
            Some((decoded, expected, xv11_checksum(&frame)))
        }
        FixedCadenceFormat::Hls => {
            let base = base_angle(body[0], HLS_READINGS as i32);
            let measurements = (0..HLS_READINGS)
                .map(|i| {
                    let offset = 3 + 6 * i;
                    let intensity = to_u16(body[offset + 1], body[offset]);
                    let distance = to_u16(body[offset + 3], body[offset + 2]);
                    Measurement {
                        angle: wrap_degree(base + i as i32),
                        distance,
                        strength: Some(intensity),
                        invalid: distance == 0,
                        low_confidence: false,
                    }
                })
                .collect();
            let decoded = FixedCadenceFrame {
                rotation_speed: (to_u16(body[2], body[1]) as f32) / 10.,
                measurements,
            };
            let expected = body[HLS_BODY_SIZE - 1];
            Some((decoded, expected.into(), hls_checksum(&frame).into()))
        }
    }
}

pub struct FixedCadenceDecoder {
    format: FixedCadenceFormat,
    policy: ChecksumPolicy,
    pending: VecDeque<Measurement>,
    rotation_speed: Option<f32>,
    stats: DecoderStats,
}

impl FixedCadenceDecoder {
    pub fn new(format: FixedCadenceFormat, policy: ChecksumPolicy) -> Self {
        FixedCadenceDecoder {
            format,
            policy,
            pending: VecDeque::with_capacity(HLS_READINGS),
            rotation_speed: None,
            stats: DecoderStats::default(),
        }
    }

    pub fn format(&self) -> FixedCadenceFormat {
        self.format
    }
}

impl PacketDecoder for FixedCadenceDecoder {
    fn next_measurement(&mut self, port: &mut dyn Read) -> Result<Measurement, LidarError> {
        loop {
            if let Some(measurement) = self.pending.pop_front() {
                return Ok(measurement);
            }
            self.stats.skipped_bytes += read_until(port, FIXED_START_BYTE)? as u64;

            let size = body_size(self.format);
            let body = read(port, size)?;
            let (frame, expected, calculated) =
                parse_body(self.format, &body).ok_or(LidarError::FramingError {
                    expected: size,
                    actual: body.len(),
                })?;
            let checksum_valid = expected == calculated;
            if !admit_frame(
                self.policy,
                &mut self.stats,
                checksum_valid,
                expected,
                calculated,
            ) {
                continue;
            }
            self.rotation_speed = Some(frame.rotation_speed);
            self.pending.extend(frame.measurements);
        }
    }

    fn rotation_speed(&self) -> Option<f32> {
        self.rotation_speed
    }

    fn stats(&self) -> DecoderStats {
        self.stats
    }
}
