use crate::constants::{
    DESCRIPTOR_MAX_SKIP, HEADER_SIZE, LIDAR_ANS_SYNC_BYTE, LIDAR_CMD_SYNC_BYTE,
};
use crate::error::{DescriptorViolation, LidarError};
use crate::numeric::to_u32;
use crate::serial::{read_byte, read_exact};
use std::io::Read;

/// Response header preceding every control channel answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub multi_response: bool,
    pub length: u32,
    pub data_type: u8,
}

/// Fields the caller insists on. `None` accepts any value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorExpectation {
    pub multi_response: Option<bool>,
    pub length: Option<u32>,
    pub data_type: Option<u8>,
}

impl DescriptorExpectation {
    pub fn single(length: u32, data_type: u8) -> Self {
        DescriptorExpectation {
            multi_response: Some(false),
            length: Some(length),
            data_type: Some(data_type),
        }
    }
}

/// Slides over the stream until `0xA5 0x5A` lines up and reads the rest of
/// the header. Returns the header and the number of bytes skipped before
/// it. Gives up with a start flag violation after `DESCRIPTOR_MAX_SKIP`
/// bytes.
pub(crate) fn read_header<P: Read + ?Sized>(
    port: &mut P,
) -> Result<([u8; HEADER_SIZE], usize), LidarError> {
    let start_flags = [LIDAR_CMD_SYNC_BYTE, LIDAR_ANS_SYNC_BYTE];
    let mut window = [0u8, read_byte(port)?];
    let mut skipped = 0;
    loop {
        window[0] = window[1];
        window[1] = read_byte(port)?;
        if window == start_flags {
            break;
        }
        skipped += 1;
        if skipped >= DESCRIPTOR_MAX_SKIP {
            return Err(DescriptorViolation::StartFlags {
                expected: start_flags,
                actual: window,
            }
            .into());
        }
    }

    let mut header = [0u8; HEADER_SIZE];
    header[..2].copy_from_slice(&start_flags);
    header[2..].copy_from_slice(&read_exact(port, HEADER_SIZE - 2)?);
    Ok((header, skipped))
}

pub(crate) fn parse_descriptor(
    header: &[u8; HEADER_SIZE],
    expect: &DescriptorExpectation,
) -> Result<Descriptor, LidarError> {
    let flags = [header[0], header[1]];
    if flags != [LIDAR_CMD_SYNC_BYTE, LIDAR_ANS_SYNC_BYTE] {
        return Err(DescriptorViolation::StartFlags {
            expected: [LIDAR_CMD_SYNC_BYTE, LIDAR_ANS_SYNC_BYTE],
            actual: flags,
        }
        .into());
    }

    let word = to_u32(&header[2..6]);
    let descriptor = Descriptor {
        multi_response: word & 0xC000_0000 != 0,
        length: word & 0x3FFF_FFFF,
        data_type: header[6],
    };

    if let Some(expected) = expect.multi_response {
        if descriptor.multi_response != expected {
            return Err(DescriptorViolation::MultiResponse {
                expected,
                actual: descriptor.multi_response,
            }
            .into());
        }
    }
    if let Some(expected) = expect.length {
        if descriptor.length != expected {
            return Err(DescriptorViolation::Length {
                expected,
                actual: descriptor.length,
            }
            .into());
        }
    }
    if let Some(expected) = expect.data_type {
        if descriptor.data_type != expected {
            return Err(DescriptorViolation::DataType {
                expected,
                actual: descriptor.data_type,
            }
            .into());
        }
    }
    Ok(descriptor)
}

/// A byte window believed to be one frame, with its checksum verdict.
#[derive(Debug, Clone)]
pub struct RawFrame<const N: usize> {
    pub bytes: [u8; N],
    pub checksum_valid: bool,
}

impl<const N: usize> RawFrame<N> {
    pub(crate) fn from_slice(data: &[u8], checksum_valid: bool) -> Option<Self> {
        let bytes: [u8; N] = data.try_into().ok()?;
        Some(RawFrame {
            bytes,
            checksum_valid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn expect(multi: Option<bool>, len: Option<u32>, dtype: Option<u8>) -> DescriptorExpectation {
        DescriptorExpectation {
            multi_response: multi,
            length: len,
            data_type: dtype,
        }
    }

    #[test]
    fn test_parse_descriptor() {
        let header = [0xA5, 0x5A, 0x14, 0x00, 0x00, 0x00, 0x04];
        assert_eq!(
            parse_descriptor(&header, &DescriptorExpectation::single(0x14, 0x04)).unwrap(),
            Descriptor {
                multi_response: false,
                length: 20,
                data_type: 0x04
            }
        );

        let header = [0xA5, 0x5A, 0x54, 0x00, 0x00, 0x40, 0x82];
        let descriptor = parse_descriptor(&header, &expect(Some(true), Some(0x54), None)).unwrap();
        assert!(descriptor.multi_response);
        assert_eq!(descriptor.length, 0x54);
        assert_eq!(descriptor.data_type, 0x82);
    }

    #[test]
    fn test_parse_descriptor_violations() {
        assert!(matches!(
            parse_descriptor(
                &[0xA6, 0x5A, 0x14, 0x00, 0x00, 0x00, 0x04],
                &DescriptorExpectation::single(0x14, 0x04)
            ),
            Err(LidarError::ProtocolViolation(DescriptorViolation::StartFlags {
                actual: [0xA6, 0x5A],
                ..
            }))
        ));

        assert!(matches!(
            parse_descriptor(
                &[0xA5, 0x2A, 0x14, 0x00, 0x00, 0x00, 0x04],
                &DescriptorExpectation::single(0x14, 0x04)
            ),
            Err(LidarError::ProtocolViolation(DescriptorViolation::StartFlags { .. }))
        ));

        assert!(matches!(
            parse_descriptor(
                &[0xA5, 0x5A, 0x14, 0x00, 0x00, 0x40, 0x04],
                &DescriptorExpectation::single(0x14, 0x04)
            ),
            Err(LidarError::ProtocolViolation(DescriptorViolation::MultiResponse {
                expected: false,
                actual: true
            }))
        ));

        assert!(matches!(
            parse_descriptor(
                &[0xA5, 0x5A, 0x14, 0x00, 0x00, 0x00, 0x04],
                &DescriptorExpectation::single(0x12, 0x04)
            ),
            Err(LidarError::ProtocolViolation(DescriptorViolation::Length {
                expected: 18,
                actual: 20
            }))
        ));

        assert!(matches!(
            parse_descriptor(
                &[0xA5, 0x5A, 0x14, 0x00, 0x00, 0x00, 0x08],
                &DescriptorExpectation::single(0x14, 0x04)
            ),
            Err(LidarError::ProtocolViolation(DescriptorViolation::DataType {
                expected: 4,
                actual: 8
            }))
        ));
    }

    #[test]
    fn test_unasserted_fields_are_ignored() {
        let header = [0xA5, 0x5A, 0x33, 0x00, 0x00, 0xC0, 0x99];
        let descriptor = parse_descriptor(&header, &DescriptorExpectation::default()).unwrap();
        assert!(descriptor.multi_response);
        assert_eq!(descriptor.length, 0x33);
    }

    #[test]
    fn test_read_header_skips_garbage() {
        for garbage in [vec![], vec![0x00], vec![0x00, 0x11, 0x22], vec![0x5A, 0xA5, 0xA5]] {
            let mut data = garbage.clone();
            data.extend_from_slice(&[0xA5, 0x5A, 0x14, 0x00, 0x00, 0x00, 0x04, 0x18]);
            let mut port = Cursor::new(data);

            let (header, skipped) = read_header(&mut port).unwrap();
            assert_eq!(header, [0xA5, 0x5A, 0x14, 0x00, 0x00, 0x00, 0x04]);
            assert_eq!(skipped, garbage.len());
            // the payload is left in place
            assert_eq!(read_byte(&mut port).unwrap(), 0x18);
        }
    }

    #[test]
    fn test_read_header_gives_up() {
        let mut port = Cursor::new(vec![0x00; DESCRIPTOR_MAX_SKIP + 10]);
        assert!(matches!(
            read_header(&mut port),
            Err(LidarError::ProtocolViolation(DescriptorViolation::StartFlags {
                actual: [0x00, 0x00],
                ..
            }))
        ));
    }

    #[test]
    fn test_read_header_cut_short() {
        let mut port = Cursor::new(vec![0x00, 0xA5, 0x5A, 0x14]);
        assert!(matches!(
            read_header(&mut port),
            Err(LidarError::Disconnected)
        ));
    }

    #[test]
    fn test_raw_frame_from_slice() {
        let frame = RawFrame::<3>::from_slice(&[1, 2, 3], false).unwrap();
        assert_eq!(frame.bytes, [1, 2, 3]);
        assert!(!frame.checksum_valid);
        assert!(RawFrame::<3>::from_slice(&[1, 2], true).is_none());
    }
}
