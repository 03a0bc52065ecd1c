use crate::assembler::DEFAULT_BOUNDARY_ANGLE;
use crate::decoder::ChecksumPolicy;
use crate::error::LidarError;
use spinlidar_data::{LidarModel, SCAN_POINTS};
use std::time::Duration;

pub const DEFAULT_SCAN_QUEUE_CAPACITY: usize = 10;

/// Settings for one driver worker.
///
/// ```
/// use spinlidar_driver::{ChecksumPolicy, DriverConfig};
/// use spinlidar_data::LidarModel;
///
/// let config = DriverConfig::new("/dev/ttyUSB0", LidarModel::RplidarA1)
///     .with_checksum_policy(ChecksumPolicy::Drop)
///     .with_scan_queue_capacity(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DriverConfig {
    pub port_name: String,
    pub model: LidarModel,
    pub read_timeout: Duration,
    pub checksum_policy: ChecksumPolicy,
    pub scan_queue_capacity: usize,
    /// Angle whose measurement completes a scan.
    pub boundary_angle: u16,
}

impl DriverConfig {
    pub fn new(port_name: impl Into<String>, model: LidarModel) -> Self {
        DriverConfig {
            port_name: port_name.into(),
            model,
            read_timeout: model.read_timeout(),
            checksum_policy: ChecksumPolicy::default(),
            scan_queue_capacity: DEFAULT_SCAN_QUEUE_CAPACITY,
            boundary_angle: DEFAULT_BOUNDARY_ANGLE,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum_policy = policy;
        self
    }

    pub fn with_scan_queue_capacity(mut self, capacity: usize) -> Self {
        self.scan_queue_capacity = capacity;
        self
    }

    pub fn with_boundary_angle(mut self, angle: u16) -> Self {
        self.boundary_angle = angle;
        self
    }

    pub fn validate(&self) -> Result<(), LidarError> {
        if self.boundary_angle as usize >= SCAN_POINTS {
            return Err(LidarError::InvalidConfig(format!(
                "boundary angle {} is out of range",
                self.boundary_angle
            )));
        }
        if self.scan_queue_capacity == 0 {
            return Err(LidarError::InvalidConfig(
                "scan queue capacity must be at least 1".to_string(),
            ));
        }
        if self.read_timeout.is_zero() {
            return Err(LidarError::InvalidConfig(
                "read timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
