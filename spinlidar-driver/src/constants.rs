pub(crate) const HEADER_SIZE: usize = 7;
pub(crate) const LIDAR_CMD_SYNC_BYTE: u8 = 0xA5;
pub(crate) const LIDAR_ANS_SYNC_BYTE: u8 = 0x5A;
pub(crate) const DESCRIPTOR_MAX_SKIP: usize = 1024;
pub(crate) const LIDAR_CMD_STOP: u8 = 0x25;
pub(crate) const LIDAR_CMD_RESET: u8 = 0x40;
pub(crate) const LIDAR_CMD_GET_DEVICE_INFO: u8 = 0x50;
pub(crate) const LIDAR_CMD_GET_DEVICE_HEALTH: u8 = 0x52;
pub(crate) const LIDAR_CMD_GET_SAMPLE_RATE: u8 = 0x59;
pub(crate) const LIDAR_CMD_EXPRESS_SCAN: u8 = 0x82;
pub(crate) const LIDAR_ANS_TYPE_DEVINFO: u8 = 0x04;
pub(crate) const LIDAR_ANS_LENGTH_DEVINFO: u32 = 20;
pub(crate) const LIDAR_ANS_TYPE_DEVHEALTH: u8 = 0x06;
pub(crate) const LIDAR_ANS_LENGTH_DEVHEALTH: u32 = 3;
pub(crate) const LIDAR_ANS_TYPE_SAMPLE_RATE: u8 = 0x15;
pub(crate) const LIDAR_ANS_LENGTH_SAMPLE_RATE: u32 = 4;
pub(crate) const LIDAR_ANS_TYPE_EXPRESS: u8 = 0x82;
pub(crate) const LIDAR_ANS_TYPE_DENSE_EXPRESS: u8 = 0x85;
pub(crate) const LIDAR_ANS_LENGTH_EXPRESS: u32 = 0x54;
pub(crate) const SAMPLE_RATE_MIN_FIRMWARE: (u8, u8) = (1, 17);
pub(crate) const RESET_BANNER_LINES: usize = 3;
pub(crate) const STOP_SETTLE_MS: u64 = 100;
/// Attempts made by the synchronizer before giving up.
pub const MAX_SYNC_ATTEMPTS: u8 = 5;

pub(crate) const EXPRESS_PAYLOAD_SIZE: usize = 82;
pub(crate) const EXPRESS_CABIN_SIZE: usize = 5;
pub(crate) const EXPRESS_CABINS: usize = 16;
pub(crate) const EXPRESS_READINGS: usize = EXPRESS_CABINS * 2;

pub(crate) const FIXED_START_BYTE: u8 = 0xFA;
pub(crate) const FIXED_INDEX_OFFSET: i32 = 160;
pub(crate) const XV11_BODY_SIZE: usize = 21;
pub(crate) const XV11_READINGS: usize = 4;
pub(crate) const HLS_BODY_SIZE: usize = 41;
pub(crate) const HLS_READINGS: usize = 6;
pub(crate) const HLS_CMD_START: u8 = b'b';
pub(crate) const HLS_CMD_STOP: u8 = b'e';
