pub mod device_info;
pub mod lidar_model;
pub mod measurement;
pub mod scan;

pub use device_info::{DeviceInfo, HealthState, HealthStatus, SampleRate};
pub use lidar_model::{model_baud_rate, FixedCadenceFormat, LidarModel, WireProtocol};
pub use measurement::{Measurement, ScanPoint};
pub use scan::{Scan, SCAN_POINTS};
