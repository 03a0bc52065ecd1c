use crate::measurement::ScanPoint;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of one-degree slots in a scan.
pub const SCAN_POINTS: usize = 360;

/// Struct to hold one lap of lidar scan data.
///
/// A scan always holds exactly [`SCAN_POINTS`] points, indexed by degree.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scan {
    /// Rotation speed in RPM, 0 until the sensor has reported one.
    rotation_speed: f32,
    points: Vec<ScanPoint>,
}

impl Scan {
    /// Returns `None` unless `points` holds exactly [`SCAN_POINTS`] entries.
    pub fn new(rotation_speed: f32, points: Vec<ScanPoint>) -> Option<Scan> {
        if points.len() != SCAN_POINTS {
            return None;
        }
        Some(Scan {
            rotation_speed,
            points,
        })
    }

    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    pub fn points(&self) -> &[ScanPoint] {
        &self.points
    }

    pub fn point(&self, angle: u16) -> Option<&ScanPoint> {
        self.points.get(angle as usize)
    }
}

impl Default for Scan {
    fn default() -> Self {
        Scan {
            rotation_speed: 0.,
            points: vec![ScanPoint::UNKNOWN; SCAN_POINTS],
        }
    }
}
