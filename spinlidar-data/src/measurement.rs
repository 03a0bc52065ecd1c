#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One reading at an integer degree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    /// Angle in degrees, always in `[0, 360)`.
    pub angle: u16,
    /// Distance in mm. Only meaningful when `invalid` is false.
    pub distance: u16,
    /// Return strength, for sensor families that report one.
    pub strength: Option<u16>,
    pub invalid: bool,
    /// The sensor flagged the reading as weak or suspicious.
    pub low_confidence: bool,
}

impl Measurement {
    pub fn point(&self) -> ScanPoint {
        ScanPoint {
            distance: self.distance,
            strength: self.strength,
            invalid: self.invalid,
            low_confidence: self.low_confidence,
        }
    }
}

/// One slot of a [`crate::Scan`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanPoint {
    pub distance: u16,
    pub strength: Option<u16>,
    pub invalid: bool,
    pub low_confidence: bool,
}

impl ScanPoint {
    /// Placeholder for a degree that has not been measured yet.
    pub const UNKNOWN: ScanPoint = ScanPoint {
        distance: 0,
        strength: None,
        invalid: true,
        low_confidence: false,
    };
}

impl Default for ScanPoint {
    fn default() -> Self {
        ScanPoint::UNKNOWN
    }
}
