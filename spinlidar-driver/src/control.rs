use crate::constants::{
    LIDAR_ANS_LENGTH_DEVHEALTH, LIDAR_ANS_LENGTH_DEVINFO, LIDAR_ANS_LENGTH_EXPRESS,
    LIDAR_ANS_LENGTH_SAMPLE_RATE, LIDAR_ANS_TYPE_DENSE_EXPRESS, LIDAR_ANS_TYPE_DEVHEALTH,
    LIDAR_ANS_TYPE_DEVINFO, LIDAR_ANS_TYPE_EXPRESS, LIDAR_ANS_TYPE_SAMPLE_RATE,
    LIDAR_CMD_EXPRESS_SCAN, LIDAR_CMD_GET_DEVICE_HEALTH, LIDAR_CMD_GET_DEVICE_INFO,
    LIDAR_CMD_GET_SAMPLE_RATE, LIDAR_CMD_RESET, LIDAR_CMD_STOP, RESET_BANNER_LINES,
    SAMPLE_RATE_MIN_FIRMWARE, STOP_SETTLE_MS,
};
use crate::decoder::ChecksumPolicy;
use crate::error::LidarError;
use crate::express::ExpressDecoder;
use crate::numeric::to_u16;
use crate::packet::{parse_descriptor, read_header, Descriptor, DescriptorExpectation};
use crate::serial::{read_exact, read_until, send_command, Transport};
use spinlidar_data::{DeviceInfo, HealthState, HealthStatus, SampleRate};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Request/response side of the RPLidar protocol.
///
/// Device info and sample rate are cached for the lifetime of a
/// synchronized session and dropped on [`ControlChannel::reset`].
pub struct ControlChannel<P: Transport> {
    port: P,
    info: Option<DeviceInfo>,
    sample_rate: Option<SampleRate>,
    skipped_bytes: u64,
}

impl<P: Transport> ControlChannel<P> {
    pub fn new(port: P) -> Self {
        ControlChannel {
            port,
            info: None,
            sample_rate: None,
            skipped_bytes: 0,
        }
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_inner(self) -> P {
        self.port
    }

    pub fn cached_info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    pub fn cached_sample_rate(&self) -> Option<&SampleRate> {
        self.sample_rate.as_ref()
    }

    /// Bytes discarded while hunting for response descriptors.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped_bytes
    }

    /// Forgets the device info and sample rate of the current session.
    pub fn clear_cache(&mut self) {
        self.info = None;
        self.sample_rate = None;
    }

    pub fn send_command(&mut self, command: u8, payload: Option<&[u8]>) -> Result<(), LidarError> {
        send_command(&mut self.port, command, payload)
    }

    pub fn read_descriptor(
        &mut self,
        expect: &DescriptorExpectation,
    ) -> Result<Descriptor, LidarError> {
        let (header, skipped) = read_header(&mut self.port)?;
        if skipped > 0 {
            self.skipped_bytes += skipped as u64;
            debug!(skipped, "Skipped bytes before response descriptor");
        }
        parse_descriptor(&header, expect)
    }

    fn query(&mut self, command: u8, length: u32, data_type: u8) -> Result<Vec<u8>, LidarError> {
        self.send_command(command, None)?;
        self.read_descriptor(&DescriptorExpectation::single(length, data_type))?;
        read_exact(&mut self.port, length as usize)
    }

    pub fn get_info(&mut self) -> Result<DeviceInfo, LidarError> {
        if let Some(info) = &self.info {
            return Ok(info.clone());
        }
        let data = self.query(
            LIDAR_CMD_GET_DEVICE_INFO,
            LIDAR_ANS_LENGTH_DEVINFO,
            LIDAR_ANS_TYPE_DEVINFO,
        )?;
        let mut serial_number = [0u8; 16];
        serial_number.copy_from_slice(&data[4..20]);
        let info = DeviceInfo {
            model_number: data[0],
            firmware_major_version: data[2],
            firmware_minor_version: data[1],
            hardware_version: data[3],
            serial_number,
        };
        self.info = Some(info.clone());
        Ok(info)
    }

    pub fn get_health(&mut self) -> Result<HealthStatus, LidarError> {
        let data = self.query(
            LIDAR_CMD_GET_DEVICE_HEALTH,
            LIDAR_ANS_LENGTH_DEVHEALTH,
            LIDAR_ANS_TYPE_DEVHEALTH,
        )?;
        Ok(HealthStatus {
            status: HealthState::from(data[0]),
            error_code: to_u16(data[2], data[1]),
        })
    }

    pub fn get_sample_rate(&mut self) -> Result<SampleRate, LidarError> {
        self.require_firmware("sample rate query", SAMPLE_RATE_MIN_FIRMWARE)?;
        if let Some(rate) = self.sample_rate {
            return Ok(rate);
        }
        let data = self.query(
            LIDAR_CMD_GET_SAMPLE_RATE,
            LIDAR_ANS_LENGTH_SAMPLE_RATE,
            LIDAR_ANS_TYPE_SAMPLE_RATE,
        )?;
        let rate = SampleRate {
            standard_period_us: to_u16(data[1], data[0]),
            express_period_us: to_u16(data[3], data[2]),
        };
        self.sample_rate = Some(rate);
        Ok(rate)
    }

    fn require_firmware(
        &mut self,
        feature: &'static str,
        required: (u8, u8),
    ) -> Result<(), LidarError> {
        let actual = self.get_info()?.firmware_version();
        if actual < required {
            return Err(LidarError::UnsupportedFeature {
                feature,
                required,
                actual,
            });
        }
        Ok(())
    }

    pub fn set_motor(&mut self, on: bool) -> Result<(), LidarError> {
        self.port.set_motor(on)
    }

    /// Restarts the device and skips its plaintext boot banner.
    pub fn reset(&mut self) -> Result<(), LidarError> {
        self.clear_cache();
        self.port.clear_input()?;
        self.send_command(LIDAR_CMD_RESET, None)?;
        self.await_reset_banner()
    }

    /// Consumes the boot banner. When a line times out the reset is sent
    /// again and the timeout is returned, so the caller decides whether to
    /// keep waiting.
    pub(crate) fn await_reset_banner(&mut self) -> Result<(), LidarError> {
        for _ in 0..RESET_BANNER_LINES {
            match read_until(&mut self.port, b'\n') {
                Ok(_) => {}
                Err(LidarError::TransportTimeout) => {
                    warn!("Reset banner timed out, sending additional reset");
                    self.send_command(LIDAR_CMD_RESET, None)?;
                    return Err(LidarError::TransportTimeout);
                }
                Err(e) => return Err(e),
            }
        }
        info!("Reset completed");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), LidarError> {
        self.send_command(LIDAR_CMD_STOP, None)?;
        self.set_motor(false)?;
        std::thread::sleep(Duration::from_millis(STOP_SETTLE_MS));
        Ok(())
    }

    /// Switches the device into express scan mode.
    pub fn start_express(&mut self, policy: ChecksumPolicy) -> Result<ExpressDecoder, LidarError> {
        debug!("Starting express scan");
        self.send_command(LIDAR_CMD_EXPRESS_SCAN, Some(&[0x00, 0x00, 0x00, 0x00, 0x00]))?;
        let descriptor = self.read_descriptor(&DescriptorExpectation {
            multi_response: Some(true),
            length: Some(LIDAR_ANS_LENGTH_EXPRESS),
            data_type: None,
        })?;
        match descriptor.data_type {
            LIDAR_ANS_TYPE_EXPRESS => Ok(ExpressDecoder::new(policy)),
            LIDAR_ANS_TYPE_DENSE_EXPRESS => Err(LidarError::UnsupportedPacketType(
                LIDAR_ANS_TYPE_DENSE_EXPRESS,
            )),
            other => Err(LidarError::UnsupportedPacketType(other)),
        }
    }
}
