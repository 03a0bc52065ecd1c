use crate::error::LidarError;
use spinlidar_data::Measurement;
use std::io::Read;
use tracing::warn;

/// What to do with a frame whose checksum does not match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Log the mismatch and decode the frame anyway.
    #[default]
    Accept,
    /// Log the mismatch and discard the frame.
    Drop,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames read after a successful resync.
    pub frames: u64,
    /// Bytes discarded while hunting for a frame start.
    pub skipped_bytes: u64,
    pub checksum_failures: u64,
    /// Frames discarded under [`ChecksumPolicy::Drop`].
    pub dropped_frames: u64,
}

/// Pull side of a wire format: each call blocks until one measurement is
/// available or the stream fails.
pub trait PacketDecoder: Send {
    fn next_measurement(&mut self, port: &mut dyn Read) -> Result<Measurement, LidarError>;

    /// Last rotation speed reported by the sensor, in RPM.
    fn rotation_speed(&self) -> Option<f32> {
        None
    }

    fn stats(&self) -> DecoderStats;
}

/// Books a checksum verdict and tells whether the frame should be decoded.
/// `expected` and `calculated` only feed the mismatch report.
pub(crate) fn admit_frame(
    policy: ChecksumPolicy,
    stats: &mut DecoderStats,
    checksum_valid: bool,
    expected: u16,
    calculated: u16,
) -> bool {
    stats.frames += 1;
    if checksum_valid {
        return true;
    }
    stats.checksum_failures += 1;
    let err = LidarError::ChecksumMismatch {
        expected,
        calculated,
    };
    match policy {
        ChecksumPolicy::Accept => {
            warn!("{err}");
            true
        }
        ChecksumPolicy::Drop => {
            warn!("{err} Frame dropped.");
            stats.dropped_frames += 1;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_frame() {
        let mut stats = DecoderStats::default();
        assert!(admit_frame(ChecksumPolicy::Drop, &mut stats, true, 0x12, 0x12));
        assert!(admit_frame(ChecksumPolicy::Accept, &mut stats, false, 0x12, 0x13));
        assert!(!admit_frame(ChecksumPolicy::Drop, &mut stats, false, 0x12, 0x13));
        assert_eq!(
            stats,
            DecoderStats {
                frames: 3,
                skipped_bytes: 0,
                checksum_failures: 2,
                dropped_frames: 1,
            }
        );
    }

    #[test]
    fn test_admit_frame_follows_frame_verdict() {
        let mut stats = DecoderStats::default();
        assert!(!admit_frame(ChecksumPolicy::Drop, &mut stats, false, 0x12, 0x12));
        assert_eq!(stats.dropped_frames, 1);
        assert_eq!(stats.checksum_failures, 1);
    }
}
