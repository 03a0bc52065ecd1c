//! Express scan frames: two sync bytes carrying a split checksum, a start
//! angle, then 16 cabins of two readings each.

use crate::constants::{EXPRESS_CABINS, EXPRESS_CABIN_SIZE, EXPRESS_PAYLOAD_SIZE, EXPRESS_READINGS};
use crate::decoder::{admit_frame, ChecksumPolicy, DecoderStats, PacketDecoder};
use crate::error::LidarError;
use crate::numeric::{q6_to_degree, to_u16, truncate_degree};
use crate::packet::RawFrame;
use crate::serial::{checksum, read, read_byte};
use spinlidar_data::Measurement;
use std::collections::VecDeque;
use std::io::Read;
use tracing::debug;

pub type ExpressRawFrame = RawFrame<EXPRESS_PAYLOAD_SIZE>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cabin {
    /// Distances in mm.
    pub distances: [u16; 2],
    /// Angular compensation in 1/8 degree. Decoded but not applied.
    pub angle_offsets_q3: [u8; 2],
}

impl Cabin {
    fn parse(bytes: &[u8]) -> Cabin {
        let d1 = to_u16(bytes[1], bytes[0]);
        let d2 = to_u16(bytes[3], bytes[2]);
        let offsets = bytes[4];
        Cabin {
            distances: [d1 >> 2, d2 >> 2],
            angle_offsets_q3: [
                (((d1 & 0x03) as u8) << 4) | (offsets & 0x0F),
                (((d2 & 0x03) as u8) << 4) | (offsets >> 4),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressFrame {
    /// Set on the first frame after the scan was started.
    pub new_scan: bool,
    /// Degrees.
    pub start_angle: f64,
    pub cabins: [Cabin; EXPRESS_CABINS],
}

impl ExpressFrame {
    pub fn parse(frame: &ExpressRawFrame) -> ExpressFrame {
        let raw_angle = to_u16(frame.bytes[1], frame.bytes[0]);
        let mut cabins = [Cabin::default(); EXPRESS_CABINS];
        for (cabin, bytes) in cabins
            .iter_mut()
            .zip(frame.bytes[2..].chunks_exact(EXPRESS_CABIN_SIZE))
        {
            *cabin = Cabin::parse(bytes);
        }
        ExpressFrame {
            new_scan: raw_angle & 0x8000 != 0,
            start_angle: q6_to_degree(raw_angle),
            cabins,
        }
    }

    fn distances(&self) -> impl Iterator<Item = u16> + '_ {
        self.cabins.iter().flat_map(|cabin| cabin.distances)
    }

    /// `(angle, distance)` of every reading, spread evenly between this
    /// frame's start angle and the start angle of the frame after it.
    pub fn readings(&self, next_start_angle: f64) -> impl Iterator<Item = (u16, u16)> + '_ {
        let wrap = if self.start_angle > next_start_angle {
            360.
        } else {
            0.
        };
        let step = (next_start_angle - self.start_angle + wrap) / (EXPRESS_READINGS as f64);
        let start = self.start_angle;
        self.distances()
            .enumerate()
            .map(move |(k, d)| (truncate_degree(start + step * (k as f64)), d))
    }
}

fn is_first_sync_byte(b: u8) -> bool {
    b & 0xF0 == 0xA0
}

fn is_second_sync_byte(b: u8) -> bool {
    b & 0xF0 == 0x50
}

/// Slides over the stream until the two sync nibbles line up, then reads
/// the payload. Returns the frame with the checksum carried by the sync
/// bytes and the one computed over the payload.
pub(crate) fn read_express_frame(
    port: &mut dyn Read,
    stats: &mut DecoderStats,
) -> Result<(ExpressRawFrame, u8, u8), LidarError> {
    let mut s1 = read_byte(port)?;
    let s2 = loop {
        if !is_first_sync_byte(s1) {
            stats.skipped_bytes += 1;
            s1 = read_byte(port)?;
            continue;
        }
        let candidate = read_byte(port)?;
        if is_second_sync_byte(candidate) {
            break candidate;
        }
        stats.skipped_bytes += 1;
        s1 = candidate;
    };
    let expected = ((s2 & 0x0F) << 4) | (s1 & 0x0F);

    let data = read(port, EXPRESS_PAYLOAD_SIZE)?;
    let calculated = checksum(&data);
    let frame = ExpressRawFrame::from_slice(&data, expected == calculated).ok_or(
        LidarError::FramingError {
            expected: EXPRESS_PAYLOAD_SIZE,
            actual: data.len(),
        },
    )?;
    Ok((frame, expected, calculated))
}

/// Decoder for the express scan stream.
///
/// A frame's readings can only be placed once the next frame's start angle
/// is known, so output lags the wire by one frame.
pub struct ExpressDecoder {
    policy: ChecksumPolicy,
    held: Option<ExpressFrame>,
    pending: VecDeque<Measurement>,
    last_angle: Option<u16>,
    stats: DecoderStats,
}

impl ExpressDecoder {
    pub fn new(policy: ChecksumPolicy) -> Self {
        ExpressDecoder {
            policy,
            held: None,
            pending: VecDeque::with_capacity(EXPRESS_READINGS),
            last_angle: None,
            stats: DecoderStats::default(),
        }
    }

    fn accept(&mut self, frame: ExpressFrame) {
        if let Some(previous) = self.held.take() {
            for (angle, distance) in previous.readings(frame.start_angle) {
                // Slow rotation repeats angles across readings.
                if self.last_angle == Some(angle) {
                    continue;
                }
                self.last_angle = Some(angle);
                self.pending.push_back(Measurement {
                    angle,
                    distance,
                    strength: None,
                    invalid: distance == 0,
                    low_confidence: false,
                });
            }
        }
        self.held = Some(frame);
    }
}

impl PacketDecoder for ExpressDecoder {
    fn next_measurement(&mut self, port: &mut dyn Read) -> Result<Measurement, LidarError> {
        loop {
            if let Some(measurement) = self.pending.pop_front() {
                return Ok(measurement);
            }
            let (raw, expected, calculated) = read_express_frame(port, &mut self.stats)?;
            if !admit_frame(
                self.policy,
                &mut self.stats,
                raw.checksum_valid,
                expected.into(),
                calculated.into(),
            ) {
                // the held frame cannot be interpolated across a gap
                self.held = None;
                continue;
            }
            let frame = ExpressFrame::parse(&raw);
            if frame.new_scan {
                debug!(skipped = self.stats.skipped_bytes, "Express scan start");
            }
            self.accept(frame);
        }
    }

    fn stats(&self) -> DecoderStats {
        self.stats
    }
}
