use std::io;
use thiserror::Error;

/// Field of a response descriptor that did not hold the expected value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorViolation {
    StartFlags { expected: [u8; 2], actual: [u8; 2] },
    MultiResponse { expected: bool, actual: bool },
    Length { expected: u32, actual: u32 },
    DataType { expected: u8, actual: u8 },
}

impl std::fmt::Display for DescriptorViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptorViolation::StartFlags { expected, actual } => write!(
                f,
                "start flags must be {:02X} {:02X}, observed {:02X} {:02X}",
                expected[0], expected[1], actual[0], actual[1]
            ),
            DescriptorViolation::MultiResponse { expected, actual } => write!(
                f,
                "expected multi-response = {}, got {}",
                expected, actual
            ),
            DescriptorViolation::Length { expected, actual } => write!(
                f,
                "expected response length of {} bytes but found {} bytes",
                expected, actual
            ),
            DescriptorViolation::DataType { expected, actual } => write!(
                f,
                "expected type code {:#04X} but obtained {:#04X}",
                expected, actual
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum LidarError {
    #[error("Protocol violation in response descriptor: {0}")]
    ProtocolViolation(DescriptorViolation),
    #[error("Checksum mismatched. Calculated = {calculated:04X}, expected = {expected:04X}.")]
    ChecksumMismatch { expected: u16, calculated: u16 },
    #[error("Frame cut short: expected {expected} bytes, read {actual}")]
    FramingError { expected: usize, actual: usize },
    #[error(
        "{feature} needs firmware {}.{} or newer, device runs {}.{}",
        .required.0, .required.1, .actual.0, .actual.1
    )]
    UnsupportedFeature {
        feature: &'static str,
        required: (u8, u8),
        actual: (u8, u8),
    },
    #[error("Unsupported packet type {0:#04X}")]
    UnsupportedPacketType(u8),
    #[error("Device did not synchronize after {attempts} attempts. Check the connection and the serial port.")]
    SyncExhausted { attempts: u8 },
    #[error("Operation timed out")]
    TransportTimeout,
    #[error("Device health error. Error code = {0:#06X}. See the development manual for details.")]
    DeviceHealthError(u16),
    #[error("Transport closed")]
    Disconnected,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Driver thread panicked")]
    WorkerPanicked,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serial(#[from] serialport::Error),
}

impl LidarError {
    /// Errors the synchronizer answers with a reset and another attempt.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LidarError::ProtocolViolation(_) | LidarError::TransportTimeout
        )
    }

    /// Errors that end a streaming session but not the worker; the session
    /// is restarted from an unsynced state.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LidarError::TransportTimeout | LidarError::FramingError { .. }
        )
    }
}

impl From<DescriptorViolation> for LidarError {
    fn from(violation: DescriptorViolation) -> Self {
        LidarError::ProtocolViolation(violation)
    }
}
