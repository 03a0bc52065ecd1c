#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Layout of a fixed-cadence frame following its `0xFA` start byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FixedCadenceFormat {
    /// Four readings per frame, angle index step of 4 degrees.
    Xv11,
    /// Six readings per frame, angle index step of 6 degrees.
    Hls,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WireProtocol {
    /// Control channel with descriptors, measurements in express frames.
    Express,
    /// No control channel, the sensor streams as soon as it spins.
    FixedCadence(FixedCadenceFormat),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LidarModel {
    RplidarA1,
    Xv11,
    HlsLfcd2,
}

impl LidarModel {
    pub fn baud_rate(&self) -> u32 {
        match self {
            LidarModel::RplidarA1 => 115200,
            LidarModel::Xv11 => 460800,
            LidarModel::HlsLfcd2 => 230400,
        }
    }

    pub fn read_timeout(&self) -> Duration {
        match self {
            LidarModel::RplidarA1 => Duration::from_secs(5),
            LidarModel::Xv11 => Duration::from_secs(2),
            LidarModel::HlsLfcd2 => Duration::from_secs(5),
        }
    }

    pub fn protocol(&self) -> WireProtocol {
        match self {
            LidarModel::RplidarA1 => WireProtocol::Express,
            LidarModel::Xv11 => WireProtocol::FixedCadence(FixedCadenceFormat::Xv11),
            LidarModel::HlsLfcd2 => WireProtocol::FixedCadence(FixedCadenceFormat::Hls),
        }
    }
}

pub fn model_baud_rate(model: LidarModel) -> u32 {
    model.baud_rate()
}
