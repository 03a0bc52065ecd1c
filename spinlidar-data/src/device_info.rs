#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity record returned by the get-info query.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceInfo {
    pub model_number: u8,
    pub firmware_major_version: u8,
    pub firmware_minor_version: u8,
    pub hardware_version: u8,
    pub serial_number: [u8; 16],
}

impl DeviceInfo {
    pub fn firmware_version(&self) -> (u8, u8) {
        (self.firmware_major_version, self.firmware_minor_version)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HealthState {
    Good,
    Warning,
    Error,
    /// Status byte outside the documented range.
    Unknown(u8),
}

impl From<u8> for HealthState {
    fn from(value: u8) -> Self {
        match value {
            0 => HealthState::Good,
            1 => HealthState::Warning,
            2 => HealthState::Error,
            other => HealthState::Unknown(other),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HealthStatus {
    pub status: HealthState,
    pub error_code: u16,
}

/// Time per sample, in microseconds, for each scan mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampleRate {
    pub standard_period_us: u16,
    pub express_period_us: u16,
}
