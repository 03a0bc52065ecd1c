use crate::constants::MAX_SYNC_ATTEMPTS;
use crate::control::ControlChannel;
use crate::error::LidarError;
use crate::serial::Transport;
use spinlidar_data::DeviceInfo;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Unsynced,
    Syncing { attempt: u8 },
    Synced,
    Failed,
}

/// Step to run before the next identity query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Recovery {
    None,
    Reset,
    /// A reset was re-sent after its banner timed out.
    AwaitBanner,
}

/// Brings the control channel to a state where the device has answered an
/// identity query with a well-formed response.
///
/// Every attempt after a failed one starts with a device reset. The budget
/// covers both identity queries and reset banners that time out.
pub struct Synchronizer {
    state: SyncState,
    max_attempts: u8,
}

impl Synchronizer {
    pub fn new() -> Self {
        Synchronizer {
            state: SyncState::Unsynced,
            max_attempts: MAX_SYNC_ATTEMPTS,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_synced(&self) -> bool {
        self.state == SyncState::Synced
    }

    pub fn synchronize<P: Transport>(
        &mut self,
        control: &mut ControlChannel<P>,
    ) -> Result<DeviceInfo, LidarError> {
        let mut recovery = Recovery::None;
        for attempt in 0..self.max_attempts {
            self.state = SyncState::Syncing { attempt };

            let prepared = match recovery {
                Recovery::None => Ok(()),
                Recovery::Reset => control.reset(),
                Recovery::AwaitBanner => control.await_reset_banner(),
            };
            if let Err(e) = prepared {
                if !e.is_recoverable() {
                    self.state = SyncState::Failed;
                    return Err(e);
                }
                warn!(attempt, error = %e, "Reset did not complete");
                recovery = match e {
                    LidarError::TransportTimeout => Recovery::AwaitBanner,
                    _ => Recovery::Reset,
                };
                continue;
            }

            match control.get_info() {
                Ok(info) => {
                    self.state = SyncState::Synced;
                    info!(
                        attempt,
                        model = info.model_number,
                        firmware = ?info.firmware_version(),
                        "Device synchronized"
                    );
                    return Ok(info);
                }
                Err(e) if e.is_recoverable() => {
                    warn!(attempt, error = %e, "Sync attempt failed, resetting device");
                    recovery = Recovery::Reset;
                }
                Err(e) => {
                    self.state = SyncState::Failed;
                    return Err(e);
                }
            }
        }
        self.state = SyncState::Failed;
        Err(LidarError::SyncExhausted {
            attempts: self.max_attempts,
        })
    }
}

impl Default for Synchronizer {
    fn default() -> Self {
        Synchronizer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{LIDAR_CMD_GET_DEVICE_INFO, LIDAR_CMD_RESET};
    use crate::testing::{ScriptedPort, INFO_RESPONSE, RESET_BANNER};

    const BAD_INFO: [u8; 7] = [0xA5, 0x5A, 0x14, 0x00, 0x00, 0x00, 0x08];

    #[test]
    fn test_synchronize_first_try() {
        let mut port = ScriptedPort::new();
        port.respond(LIDAR_CMD_GET_DEVICE_INFO, &INFO_RESPONSE);
        let mut control = ControlChannel::new(port);
        let mut sync = Synchronizer::new();
        assert_eq!(sync.state(), SyncState::Unsynced);

        let info = sync.synchronize(&mut control).unwrap();
        assert_eq!(info.model_number, 0x18);
        assert!(sync.is_synced());
        assert_eq!(control.port_mut().count(LIDAR_CMD_RESET), 0);
    }

    #[test]
    fn test_synchronize_past_leading_garbage() {
        let mut response = vec![0x00, 0x11, 0x22];
        response.extend_from_slice(&INFO_RESPONSE);
        let mut port = ScriptedPort::new();
        port.respond(LIDAR_CMD_GET_DEVICE_INFO, &response);
        let mut control = ControlChannel::new(port);
        let mut sync = Synchronizer::new();

        let info = sync.synchronize(&mut control).unwrap();
        assert_eq!(info.firmware_version(), (1, 29));
        assert!(sync.is_synced());
        assert_eq!(control.skipped_bytes(), 3);
        assert_eq!(control.port_mut().count(LIDAR_CMD_RESET), 0);
        assert_eq!(control.port_mut().count(LIDAR_CMD_GET_DEVICE_INFO), 1);
    }

    #[test]
    fn test_synchronize_after_reset() {
        let mut port = ScriptedPort::new();
        port.respond(LIDAR_CMD_GET_DEVICE_INFO, &BAD_INFO);
        port.respond(LIDAR_CMD_GET_DEVICE_INFO, &INFO_RESPONSE);
        port.respond(LIDAR_CMD_RESET, RESET_BANNER);
        let mut control = ControlChannel::new(port);
        let mut sync = Synchronizer::new();

        sync.synchronize(&mut control).unwrap();
        assert!(sync.is_synced());
        assert_eq!(control.port_mut().count(LIDAR_CMD_RESET), 1);
        assert_eq!(control.port_mut().count(LIDAR_CMD_GET_DEVICE_INFO), 2);
    }

    #[test]
    fn test_sync_exhausted_after_five_attempts() {
        let mut port = ScriptedPort::new();
        for _ in 0..5 {
            port.respond(LIDAR_CMD_GET_DEVICE_INFO, &BAD_INFO);
            port.respond(LIDAR_CMD_RESET, RESET_BANNER);
        }
        // a sixth query would succeed
        port.respond(LIDAR_CMD_GET_DEVICE_INFO, &INFO_RESPONSE);
        let mut control = ControlChannel::new(port);
        let mut sync = Synchronizer::new();

        assert!(matches!(
            sync.synchronize(&mut control),
            Err(LidarError::SyncExhausted { attempts: 5 })
        ));
        assert_eq!(sync.state(), SyncState::Failed);
        assert_eq!(control.port_mut().count(LIDAR_CMD_GET_DEVICE_INFO), 5);
        assert_eq!(control.port_mut().count(LIDAR_CMD_RESET), 4);
    }

    #[test]
    fn test_banner_timeouts_use_the_budget() {
        let mut port = ScriptedPort::new();
        port.respond(LIDAR_CMD_GET_DEVICE_INFO, &BAD_INFO);
        // first reset prints one line only, the re-sent one completes
        port.respond(LIDAR_CMD_RESET, b"RP LIDAR System.\r\n");
        port.respond(LIDAR_CMD_RESET, RESET_BANNER);
        port.respond(LIDAR_CMD_GET_DEVICE_INFO, &INFO_RESPONSE);
        let mut control = ControlChannel::new(port);
        let mut sync = Synchronizer::new();

        sync.synchronize(&mut control).unwrap();
        assert_eq!(control.port_mut().count(LIDAR_CMD_RESET), 2);
        assert_eq!(control.port_mut().count(LIDAR_CMD_GET_DEVICE_INFO), 2);
    }

    #[test]
    fn test_silent_device_exhausts() {
        let mut control = ControlChannel::new(ScriptedPort::new());
        let mut sync = Synchronizer::new();
        assert!(matches!(
            sync.synchronize(&mut control),
            Err(LidarError::SyncExhausted { .. })
        ));
        assert_eq!(control.port_mut().count(LIDAR_CMD_GET_DEVICE_INFO), 1);
    }

    #[test]
    fn test_disconnect_is_not_retried() {
        let mut port = ScriptedPort::new();
        port.closed = true;
        let mut control = ControlChannel::new(port);
        let mut sync = Synchronizer::new();
        assert!(matches!(
            sync.synchronize(&mut control),
            Err(LidarError::Disconnected)
        ));
        assert_eq!(sync.state(), SyncState::Failed);
    }
}
